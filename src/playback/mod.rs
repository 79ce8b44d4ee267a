pub mod engine;
pub mod session;

pub use engine::PlaybackEngine;
pub use session::{PlaybackSession, SessionStats};

use std::time::Duration;

/// Default interval between playback ticks
pub const TICK_INTERVAL: Duration = Duration::from_millis(120);

/// Playback state
///
/// Pausing reuses `Ready`: a paused session is `Ready` with a nonzero
/// cursor. `Finished` is distinct so consumers can show a completed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No timeline loaded
    Idle,
    /// Timeline loaded, cursor parked, not advancing
    Ready,
    /// Cursor advancing on the tick interval
    Playing,
    /// Cursor at the last frame, advancing stopped
    Finished,
}

/// Playback configuration
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Base interval between ticks
    pub tick_interval: Duration,
    /// Speed multiplier, 1.0 = normal (clamped to 0.1-10.0)
    pub speed: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_interval: TICK_INTERVAL,
            speed: 1.0,
        }
    }
}

impl PlaybackConfig {
    /// Effective wall-clock interval between ticks after the speed multiplier
    pub fn effective_interval(&self) -> Duration {
        let speed = self.speed.clamp(0.1, 10.0);
        Duration::from_secs_f64(self.tick_interval.as_secs_f64() / speed)
    }
}
