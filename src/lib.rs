//! pitwall - race simulation timeline playback engine
//!
//! Takes the flat per-lap snapshot records produced by a race simulator,
//! normalizes them into an ordered sequence of immutable frames, derives
//! presentation metrics (speed estimate, position change, pit status), and
//! drives a controllable playback cursor (play / pause / reset / seek) over
//! the sequence at a fixed tick cadence. Rendering, transport, and the
//! simulator itself are external collaborators.

pub mod config;
pub mod core;
pub mod input;
pub mod metrics;
pub mod playback;
pub mod source;
pub mod timeline;

pub use self::config::Settings;
pub use self::core::{Action, AgentSnapshot, Frame, RaceEvent, RaceTimeline, RawEntry};
pub use self::metrics::{MetricCalculator, DEFAULT_JITTER_SEED};
pub use self::playback::{
    PlaybackConfig, PlaybackEngine, PlaybackSession, PlaybackState, TICK_INTERVAL,
};
pub use self::source::{FileSource, SyntheticSource, TimelineSource};
pub use self::timeline::{normalize, TimelineError};
