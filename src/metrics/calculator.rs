use crate::core::{AgentSnapshot, Frame};
use crate::metrics::rng::XorShiftRng;

/// Lower bound for the displayed speed estimate, km/h
pub const SPEED_MIN_KMH: f64 = 70.0;

/// Upper bound for the displayed speed estimate, km/h
pub const SPEED_MAX_KMH: f64 = 120.0;

/// Seed used when the caller does not supply one
pub const DEFAULT_JITTER_SEED: u64 = 0x7217_99A5_0C64_B11F;

/// Baseline speed shown for a reference-pace lap, km/h
const BASELINE_SPEED_KMH: f64 = 95.0;

/// Lap time the baseline speed corresponds to, seconds
const REFERENCE_LAP_SECS: f64 = 90.0;

/// Half-width of the presentation jitter band, km/h
const JITTER_SPAN_KMH: f64 = 4.0;

/// Computes the derived presentation metrics for agent snapshots
///
/// Speed is a display heuristic, not physics: a baseline scaled by the
/// inverse of the lap time, plus bounded jitter, clamped to
/// [`SPEED_MIN_KMH`, `SPEED_MAX_KMH`]. The jitter is a pure function of
/// (seed, agent, lap), so re-reading the same frame yields the same value
/// and tests can fix the seed.
#[derive(Debug, Clone)]
pub struct MetricCalculator {
    seed: u64,
}

impl MetricCalculator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Speed estimate in km/h for one agent on one lap
    pub fn speed(&self, agent_id: &str, lap: u32, lap_time: f64) -> f64 {
        let base = if lap_time > 0.0 {
            BASELINE_SPEED_KMH * (REFERENCE_LAP_SECS / lap_time)
        } else {
            BASELINE_SPEED_KMH
        };
        (base + self.jitter(agent_id, lap)).clamp(SPEED_MIN_KMH, SPEED_MAX_KMH)
    }

    /// Positions gained versus the previous frame (positive = advanced)
    ///
    /// Zero when there is no previous frame or the agent was absent from it.
    pub fn position_change(previous: Option<&Frame>, agent_id: &str, position: u32) -> i32 {
        match previous.and_then(|frame| frame.agent(agent_id)) {
            Some(prev) => prev.position as i32 - position as i32,
            None => 0,
        }
    }

    /// Return `frame` with derived fields recomputed against `previous`
    pub fn annotate(&self, frame: &Frame, previous: Option<&Frame>) -> Frame {
        let agents = frame
            .agents
            .iter()
            .map(|agent| AgentSnapshot {
                speed: self.speed(&agent.id, frame.lap, agent.lap_time),
                position_change: Self::position_change(previous, &agent.id, agent.position),
                ..agent.clone()
            })
            .collect();

        Frame {
            lap: frame.lap,
            agents,
            timestamp: frame.timestamp,
        }
    }

    /// Annotate a whole frame sequence, each frame against its predecessor
    pub fn derive(&self, frames: &[Frame]) -> Vec<Frame> {
        frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let previous = i.checked_sub(1).map(|p| &frames[p]);
                self.annotate(frame, previous)
            })
            .collect()
    }

    // FNV-1a over the agent id, mixed with the lap, seeding one jitter draw.
    fn jitter(&self, agent_id: &str, lap: u32) -> f64 {
        let mut hash = self.seed ^ 0xCBF2_9CE4_8422_2325;
        for byte in agent_id.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
        }
        hash ^= u64::from(lap).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = XorShiftRng::new(hash);
        rng.range_f64(-JITTER_SPAN_KMH, JITTER_SPAN_KMH)
    }
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_JITTER_SEED)
    }
}
