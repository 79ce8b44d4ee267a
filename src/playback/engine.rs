use std::time::Duration;

use crate::core::{Frame, RaceEvent, RaceTimeline};
use crate::metrics::{MetricCalculator, DEFAULT_JITTER_SEED};
use crate::playback::{PlaybackConfig, PlaybackState};
use crate::timeline::{normalize, TimelineError};

/// Playback engine for a normalized race timeline
///
/// A synchronous state machine over an immutable frame sequence. The engine
/// owns the cursor and playing flag exclusively; timer scheduling lives in
/// the session layer, which calls `tick()` once per interval. Every frame
/// handed out is annotated with derived metrics against its predecessor -
/// during playback the cursor advances by exactly one frame per tick, so
/// the predecessor is always the immediately preceding emitted frame.
pub struct PlaybackEngine {
    frames: Vec<Frame>,
    events: Vec<RaceEvent>,
    config: PlaybackConfig,
    metrics: MetricCalculator,
    state: PlaybackState,
    cursor: usize,
    elapsed: Duration,
}

impl PlaybackEngine {
    pub fn new(config: PlaybackConfig) -> Self {
        Self::with_seed(config, DEFAULT_JITTER_SEED)
    }

    /// Create an engine with an explicit jitter seed (tests pin this)
    pub fn with_seed(config: PlaybackConfig, seed: u64) -> Self {
        Self {
            frames: Vec::new(),
            events: Vec::new(),
            config,
            metrics: MetricCalculator::new(seed),
            state: PlaybackState::Idle,
            cursor: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Normalize a raw timeline and load it, replacing any previous one
    ///
    /// Normalization happens once, here; replaying or seeking never
    /// re-derives the frame sequence. Errors leave the engine unchanged.
    pub fn load_timeline(&mut self, timeline: &RaceTimeline) -> Result<(), TimelineError> {
        let frames = normalize(&timeline.entries, self.config.tick_interval)?;
        self.load_frames(frames, timeline.events.clone());
        Ok(())
    }

    /// Load an already-normalized frame sequence. Any state -> Ready.
    ///
    /// An empty sequence is not an error; the engine stays `Ready` and
    /// `play()` on it is a no-op.
    pub fn load_frames(&mut self, frames: Vec<Frame>, events: Vec<RaceEvent>) {
        self.frames = frames;
        self.events = events;
        self.cursor = 0;
        self.elapsed = Duration::ZERO;
        self.state = PlaybackState::Ready;
    }

    /// Start or resume playback
    ///
    /// Returns whether the state actually transitioned to `Playing`; the
    /// session layer creates a timer only on `true`, which is the structural
    /// guard against duplicate timers. No-op when already playing, when the
    /// sequence is empty, before any load, and after finishing (a finished
    /// run needs an explicit `reset` or `load`).
    pub fn play(&mut self) -> bool {
        if self.frames.is_empty() || self.state != PlaybackState::Ready {
            return false;
        }
        self.state = PlaybackState::Playing;
        true
    }

    /// Advance the cursor by one frame and return the newly emitted frame
    ///
    /// Only advances while `Playing`. Reaching the last frame transitions to
    /// `Finished`; no further ticks advance anything until `reset`/`load`.
    pub fn tick(&mut self) -> Option<Frame> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        if self.cursor + 1 >= self.frames.len() {
            // Single-frame timeline: nothing left to advance to
            self.state = PlaybackState::Finished;
            return None;
        }

        self.cursor += 1;
        self.elapsed += self.config.tick_interval;
        if self.cursor == self.frames.len() - 1 {
            self.state = PlaybackState::Finished;
        }
        Some(self.annotated(self.cursor))
    }

    /// Pause playback at the current cursor. No-op unless playing.
    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Ready;
        }
    }

    /// Move the cursor back to the start. No-op before any load.
    pub fn reset(&mut self) {
        if self.state == PlaybackState::Idle {
            return;
        }
        self.cursor = 0;
        self.elapsed = Duration::ZERO;
        self.state = PlaybackState::Ready;
    }

    /// Seek to a frame index, clamped into range
    ///
    /// Never faults; leaves the play/pause state untouched. No-op when no
    /// timeline is loaded.
    pub fn seek(&mut self, index: usize) {
        if self.state == PlaybackState::Idle || self.frames.is_empty() {
            return;
        }
        self.cursor = index.min(self.frames.len() - 1);
        self.elapsed = self.config.tick_interval * self.cursor as u32;
    }

    /// Step forward by one frame, pausing playback
    pub fn step_forward(&mut self) {
        if self.state == PlaybackState::Idle || self.frames.is_empty() {
            return;
        }
        if self.cursor + 1 < self.frames.len() {
            self.cursor += 1;
            self.elapsed += self.config.tick_interval;
        }
        // Stepping always pauses
        self.state = PlaybackState::Ready;
    }

    /// Step backward by one frame, pausing playback
    pub fn step_back(&mut self) {
        if self.state == PlaybackState::Idle || self.frames.is_empty() {
            return;
        }
        if self.cursor > 0 {
            self.cursor -= 1;
            self.elapsed = self.config.tick_interval * self.cursor as u32;
        }
        self.state = PlaybackState::Ready;
    }

    /// Set playback speed (clamped to 0.1-10.0)
    pub fn set_speed(&mut self, speed: f64) {
        self.config.speed = speed.clamp(0.1, 10.0);
    }

    /// Current playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_finished(&self) -> bool {
        self.state == PlaybackState::Finished
    }

    /// Current cursor position (index into the frame sequence)
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Total number of frames in the loaded sequence
    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    /// Lap number of the current frame, 0 before any load
    pub fn current_lap(&self) -> u32 {
        self.frames.get(self.cursor).map(|f| f.lap).unwrap_or(0)
    }

    /// Lap number of the final frame, 0 before any load
    pub fn total_laps(&self) -> u32 {
        self.frames.last().map(|f| f.lap).unwrap_or(0)
    }

    /// Logical elapsed playback time (frames advanced x tick interval)
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Playback configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// Current frame with derived metrics, or None before any load
    pub fn current_frame(&self) -> Option<Frame> {
        if self.frames.is_empty() {
            return None;
        }
        Some(self.annotated(self.cursor))
    }

    /// The newest `limit` events at or before the current lap
    ///
    /// Events without a lap tag are always visible.
    pub fn recent_events(&self, limit: usize) -> Vec<RaceEvent> {
        if self.frames.is_empty() || limit == 0 {
            return Vec::new();
        }
        let current = self.current_lap();
        let visible: Vec<RaceEvent> = self
            .events
            .iter()
            .filter(|event| event.lap().map_or(true, |lap| lap <= current))
            .cloned()
            .collect();
        let start = visible.len().saturating_sub(limit);
        visible[start..].to_vec()
    }

    fn annotated(&self, index: usize) -> Frame {
        let previous = index.checked_sub(1).map(|p| &self.frames[p]);
        self.metrics.annotate(&self.frames[index], previous)
    }
}
