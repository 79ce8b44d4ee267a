use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::core::event::RaceEvent;

/// Driving action an agent chose for a lap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    PushHard,
    PushMedium,
    #[default]
    Maintain,
    ConserveLow,
    ConserveMedium,
    ConserveHigh,
    PitStop,
    None,
}

impl Action {
    /// Whether this action puts the agent in the pit lane
    pub fn is_pit_stop(&self) -> bool {
        matches!(self, Action::PitStop)
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push_hard" => Ok(Action::PushHard),
            "push_medium" => Ok(Action::PushMedium),
            "maintain" => Ok(Action::Maintain),
            "conserve_low" => Ok(Action::ConserveLow),
            "conserve_medium" => Ok(Action::ConserveMedium),
            "conserve_high" => Ok(Action::ConserveHigh),
            "pit_stop" => Ok(Action::PitStop),
            "none" => Ok(Action::None),
            other => Err(format!("unknown action: {:?}", other)),
        }
    }
}

/// One agent's record at one lap, as produced by the simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEntry {
    /// Stable agent identifier
    pub agent_id: String,

    /// Display name; falls back to the id when absent
    #[serde(default)]
    pub agent_name: Option<String>,

    /// Lap index, starting at 1
    pub lap: u32,

    /// Race standing within the lap (1 = leader)
    pub position: u32,

    /// Lap time in seconds
    pub lap_time: f64,

    /// Tyre wear percentage (0-100)
    pub tyre_wear: f64,

    /// Action the agent took this lap
    #[serde(default)]
    pub action: Action,
}

impl RawEntry {
    /// Display name for this entry's agent
    pub fn display_name(&self) -> &str {
        self.agent_name.as_deref().unwrap_or(&self.agent_id)
    }
}

/// A complete simulator output: flat per-lap entries plus discrete events
///
/// Arrives atomically (one fetch per simulation run) and is replaced
/// wholesale when a new run arrives; nothing is appended incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RaceTimeline {
    pub entries: Vec<RawEntry>,

    /// Display-only side data, not consumed by the playback state machine
    #[serde(default)]
    pub events: Vec<RaceEvent>,
}
