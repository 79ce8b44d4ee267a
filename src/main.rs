use anyhow::Result;
use tracing::{info, warn};

use pitwall::config::Settings;
use pitwall::playback::PlaybackSession;
use pitwall::source::{FileSource, SyntheticSource, TimelineSource};

/// Laps generated when no timeline file is given
const DEMO_LAPS: u32 = 12;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let settings = Settings::load();

    // First argument selects a simulator export; otherwise run the demo race
    let mut source: Box<dyn TimelineSource> = match std::env::args().nth(1) {
        Some(path) => Box::new(FileSource::new(&path)),
        None => Box::new(SyntheticSource::new(DEMO_LAPS, settings.jitter_seed)),
    };

    info!("Fetching timeline from {}", source.name());
    let timeline = source
        .fetch()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to fetch timeline: {}", e))?;

    let (session, mut frames) =
        PlaybackSession::with_seed(settings.playback_config(), settings.jitter_seed);
    session.load(&timeline).await?;

    if session.total_frames().await == 0 {
        warn!("Timeline is empty, nothing to play");
        return Ok(());
    }

    info!(
        "Playing {} frames across {} laps",
        session.total_frames().await,
        session.total_laps().await
    );
    session.play().await;

    while let Some(frame) = frames.recv().await {
        let standings = frame
            .agents
            .iter()
            .map(|agent| {
                format!(
                    "P{} {} {:.1} km/h{}",
                    agent.position,
                    agent.name,
                    agent.speed,
                    if agent.is_pitting { " [PIT]" } else { "" }
                )
            })
            .collect::<Vec<_>>()
            .join(" | ");
        info!("Lap {:>2}: {}", frame.lap, standings);

        for event in session.recent_events(settings.recent_events).await {
            if event.lap() == Some(frame.lap) {
                info!("        {}", event.describe());
            }
        }

        if session.is_finished().await {
            break;
        }
    }

    info!("Playback complete after {:?}", session.elapsed().await);
    Ok(())
}
