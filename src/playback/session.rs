use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::core::{Frame, RaceEvent, RaceTimeline};
use crate::playback::{PlaybackConfig, PlaybackEngine, PlaybackState};
use crate::timeline::TimelineError;

/// Capacity of the frame channel to consumers
const FRAME_CHANNEL_CAPACITY: usize = 64;

/// Statistics for a playback session
#[derive(Default)]
pub struct SessionStats {
    /// Frames emitted over the channel since the session was created
    pub frames_emitted: AtomicU64,
    /// Ticker tasks spawned; exactly one is ever live at a time
    pub tickers_spawned: AtomicU64,
    /// When playback was last started
    pub started_at: std::sync::Mutex<Option<DateTime<Utc>>>,
}

/// A playback session: one engine, one timer, one frame stream
///
/// Owns its cursor and timer handle exclusively; two dashboards mean two
/// sessions. The ticking timer is a spawned task gated by a generation
/// counter: `load`, `pause`, `reset` and `set_speed` bump the generation so
/// any outstanding ticker dies before its next tick can fire against
/// replaced state. `play` spawns a ticker only when the engine actually
/// transitioned to `Playing`, so a second `play` can never create a second
/// timer. Ticks already in flight are never interrupted; cancellation takes
/// effect at the next tick boundary.
pub struct PlaybackSession {
    engine: Arc<Mutex<PlaybackEngine>>,
    frame_tx: mpsc::Sender<Frame>,
    generation: Arc<AtomicU64>,
    stats: Arc<SessionStats>,
}

impl PlaybackSession {
    /// Create a session and the channel on which ticked frames arrive
    pub fn new(config: PlaybackConfig) -> (Self, mpsc::Receiver<Frame>) {
        let engine = PlaybackEngine::new(config);
        Self::from_engine(engine)
    }

    /// Create a session with an explicit jitter seed
    pub fn with_seed(config: PlaybackConfig, seed: u64) -> (Self, mpsc::Receiver<Frame>) {
        let engine = PlaybackEngine::with_seed(config, seed);
        Self::from_engine(engine)
    }

    fn from_engine(engine: PlaybackEngine) -> (Self, mpsc::Receiver<Frame>) {
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let session = Self {
            engine: Arc::new(Mutex::new(engine)),
            frame_tx,
            generation: Arc::new(AtomicU64::new(0)),
            stats: Arc::new(SessionStats::default()),
        };
        (session, frame_rx)
    }

    /// Load a raw timeline, replacing any previous one atomically
    ///
    /// Cancels the outstanding timer before the swap so a stale tick can
    /// never fire against the replaced timeline.
    pub async fn load(&self, timeline: &RaceTimeline) -> Result<(), TimelineError> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut engine = self.engine.lock().await;
        engine.load_timeline(timeline)
    }

    /// Start or resume playback
    pub async fn play(&self) {
        let mut engine = self.engine.lock().await;
        if !engine.play() {
            return;
        }
        let period = engine.config().effective_interval();
        // Bump under the engine lock: an old ticker already waiting on the
        // mutex will fail its generation re-check instead of double-ticking.
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        drop(engine);

        if let Ok(mut started_at) = self.stats.started_at.lock() {
            *started_at = Some(Utc::now());
        }
        self.spawn_ticker(token, period);
    }

    /// Pause playback; the next scheduled tick is cancelled
    pub async fn pause(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.lock().await.pause();
    }

    /// Stop any running timer and move the cursor back to the start
    pub async fn reset(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.lock().await.reset();
    }

    /// Seek to a frame index (clamped); play/pause state is untouched
    pub async fn seek(&self, index: usize) {
        self.engine.lock().await.seek(index);
    }

    /// Step forward one frame, pausing playback
    pub async fn step_forward(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.lock().await.step_forward();
    }

    /// Step backward one frame, pausing playback
    pub async fn step_back(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.lock().await.step_back();
    }

    /// Change playback speed; a running timer is re-armed at the new cadence
    pub async fn set_speed(&self, speed: f64) {
        let mut engine = self.engine.lock().await;
        engine.set_speed(speed);
        if engine.is_playing() {
            let period = engine.config().effective_interval();
            let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            drop(engine);
            self.spawn_ticker(token, period);
        }
    }

    pub async fn state(&self) -> PlaybackState {
        self.engine.lock().await.state()
    }

    pub async fn is_playing(&self) -> bool {
        self.engine.lock().await.is_playing()
    }

    pub async fn is_finished(&self) -> bool {
        self.engine.lock().await.is_finished()
    }

    /// Current frame with derived metrics, or None before any load
    pub async fn current_frame(&self) -> Option<Frame> {
        self.engine.lock().await.current_frame()
    }

    pub async fn current_lap(&self) -> u32 {
        self.engine.lock().await.current_lap()
    }

    pub async fn total_laps(&self) -> u32 {
        self.engine.lock().await.total_laps()
    }

    pub async fn total_frames(&self) -> usize {
        self.engine.lock().await.total_frames()
    }

    /// Logical elapsed playback time
    pub async fn elapsed(&self) -> Duration {
        self.engine.lock().await.elapsed()
    }

    /// The newest `limit` events at or before the current lap
    pub async fn recent_events(&self, limit: usize) -> Vec<RaceEvent> {
        self.engine.lock().await.recent_events(limit)
    }

    /// Session statistics
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    fn spawn_ticker(&self, token: u64, period: Duration) {
        let engine = Arc::clone(&self.engine);
        let generation = Arc::clone(&self.generation);
        let frame_tx = self.frame_tx.clone();
        let stats = Arc::clone(&self.stats);
        stats.tickers_spawned.fetch_add(1, Ordering::SeqCst);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first interval tick completes immediately; consume it so
            // the cursor first moves one full period from now.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if generation.load(Ordering::SeqCst) != token {
                    break;
                }
                let mut engine_guard = engine.lock().await;
                if generation.load(Ordering::SeqCst) != token {
                    break;
                }
                if !engine_guard.is_playing() {
                    break;
                }

                let frame = engine_guard.tick();
                let finished = engine_guard.is_finished();
                drop(engine_guard);

                if let Some(frame) = frame {
                    stats.frames_emitted.fetch_add(1, Ordering::SeqCst);
                    if frame_tx.send(frame).await.is_err() {
                        debug!("Frame receiver dropped, stopping ticker");
                        engine.lock().await.pause();
                        break;
                    }
                }
                if finished {
                    debug!("Playback finished");
                    break;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Action, RawEntry};
    use tokio::time::timeout;

    fn entry(agent: &str, lap: u32, position: u32) -> RawEntry {
        RawEntry {
            agent_id: agent.to_string(),
            agent_name: None,
            lap,
            position,
            lap_time: 90.0,
            tyre_wear: 5.0,
            action: Action::Maintain,
        }
    }

    fn timeline(laps: u32) -> RaceTimeline {
        let mut entries = Vec::new();
        for lap in 1..=laps {
            entries.push(entry("a", lap, 1));
            entries.push(entry("b", lap, 2));
        }
        RaceTimeline {
            entries,
            events: Vec::new(),
        }
    }

    async fn drain(rx: &mut mpsc::Receiver<Frame>) -> Vec<Frame> {
        let mut frames = Vec::new();
        // Virtual time: the timeout only fires once no ticker is runnable
        while let Ok(Some(frame)) = timeout(Duration::from_secs(60), rx.recv()).await {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test(start_paused = true)]
    async fn test_playback_emits_every_frame_then_stops() {
        let (session, mut rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&timeline(5)).await.unwrap();
        session.play().await;

        let frames = drain(&mut rx).await;
        let laps: Vec<u32> = frames.iter().map(|f| f.lap).collect();
        assert_eq!(laps, vec![2, 3, 4, 5]);
        assert!(session.is_finished().await);
        assert_eq!(session.stats().frames_emitted.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_play_spawns_exactly_one_ticker() {
        let (session, mut rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&timeline(4)).await.unwrap();
        session.play().await;
        session.play().await;
        session.play().await;

        assert_eq!(session.stats().tickers_spawned.load(Ordering::SeqCst), 1);
        let frames = drain(&mut rx).await;
        // One timer's worth of emissions, each lap exactly once
        assert_eq!(frames.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_on_empty_timeline_is_noop() {
        let (session, _rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&RaceTimeline::default()).await.unwrap();
        session.play().await;
        assert!(!session.is_playing().await);
        assert_eq!(session.stats().tickers_spawned.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_cancels_stale_ticker() {
        let (session, mut rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&timeline(50)).await.unwrap();
        session.play().await;

        // Replace the timeline mid-flight and play the new one
        session.load(&timeline(3)).await.unwrap();
        session.play().await;

        let frames = drain(&mut rx).await;
        // Only the new run's frames arrive; a stale timer against the old
        // 50-lap timeline would have produced extra emissions.
        let laps: Vec<u32> = frames.iter().map(|f| f.lap).collect();
        assert_eq!(laps, vec![2, 3]);
        assert_eq!(session.stats().tickers_spawned.load(Ordering::SeqCst), 2);
        assert!(session.is_finished().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_cancels_next_tick() {
        let (session, mut rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&timeline(10)).await.unwrap();
        session.play().await;
        session.pause().await;

        let frames = drain(&mut rx).await;
        assert!(frames.is_empty());
        assert!(!session.is_playing().await);
        assert_eq!(session.state().await, PlaybackState::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_is_idempotent_and_stops_playback() {
        let (session, mut rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&timeline(6)).await.unwrap();
        session.play().await;
        session.reset().await;
        session.reset().await;
        session.reset().await;

        assert!(!session.is_playing().await);
        assert_eq!(session.current_lap().await, 1);
        assert_eq!(session.elapsed().await, Duration::ZERO);
        let frames = drain(&mut rx).await;
        assert!(frames.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_after_pause_continues_from_cursor() {
        let (session, mut rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.load(&timeline(4)).await.unwrap();
        session.play().await;

        let first = timeout(Duration::from_secs(60), rx.recv()).await.unwrap().unwrap();
        assert_eq!(first.lap, 2);
        session.pause().await;

        session.play().await;
        let frames = drain(&mut rx).await;
        let laps: Vec<u32> = frames.iter().map(|f| f.lap).collect();
        assert_eq!(laps, vec![3, 4]);
        assert_eq!(session.stats().tickers_spawned.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_before_load_are_inert() {
        let (session, _rx) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        session.pause().await;
        session.reset().await;
        session.seek(3).await;
        session.play().await;
        assert_eq!(session.state().await, PlaybackState::Idle);
        assert!(session.current_frame().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sessions_do_not_share_state() {
        let (one, _rx1) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        let (two, _rx2) = PlaybackSession::with_seed(PlaybackConfig::default(), 7);
        one.load(&timeline(5)).await.unwrap();
        two.load(&timeline(5)).await.unwrap();

        one.play().await;
        assert!(one.is_playing().await);
        assert!(!two.is_playing().await);

        two.seek(4).await;
        assert_eq!(two.current_lap().await, 5);
        assert!(one.current_lap().await < 5);
    }
}
