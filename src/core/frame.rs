use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One agent's normalized state within a frame, including derived fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    /// Stable agent identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Race standing within the lap (1 = leader)
    pub position: u32,

    /// Lap time in seconds
    pub lap_time: f64,

    /// Tyre wear percentage (0-100)
    pub tyre_wear: f64,

    /// Whether the agent pitted this lap
    pub is_pitting: bool,

    /// Derived speed estimate in km/h (zero until metrics are applied)
    pub speed: f64,

    /// Positions gained since the previous frame (positive = advanced)
    pub position_change: i32,
}

/// One lap's normalized, ordered snapshot of all agents
///
/// Immutable once built: replaying or seeking never re-derives the frame
/// sequence, and derived fields are always recomputed rather than mutated
/// in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Lap index, starting at 1
    pub lap: u32,

    /// Agents in race-standing order (ascending position)
    pub agents: Vec<AgentSnapshot>,

    /// Playback-relative timestamp (frame index x frame interval)
    pub timestamp: Duration,
}

impl Frame {
    /// Look up an agent's snapshot by id
    pub fn agent(&self, id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// The agent currently leading the race, if any
    pub fn leader(&self) -> Option<&AgentSnapshot> {
        self.agents.first()
    }
}
