use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::metrics::DEFAULT_JITTER_SEED;
use crate::playback::{PlaybackConfig, TICK_INTERVAL};

/// Persistent engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Milliseconds between playback ticks
    pub tick_ms: u64,
    /// Playback speed multiplier
    pub speed: f64,
    /// Number of entries shown in the recent-events feed
    pub recent_events: usize,
    /// Seed for the deterministic speed jitter
    pub jitter_seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_ms: TICK_INTERVAL.as_millis() as u64,
            speed: 1.0,
            recent_events: 5,
            jitter_seed: DEFAULT_JITTER_SEED,
        }
    }
}

impl Settings {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pitwall").join("settings.json"))
    }

    /// Load settings from the config directory, falling back to defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => match serde_json::from_str(&contents) {
                        Ok(settings) => return settings,
                        Err(e) => warn!("Ignoring malformed settings file: {}", e),
                    },
                    Err(e) => warn!("Failed to read settings file: {}", e),
                }
            }
        }
        Self::default()
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory available")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// Playback configuration derived from these settings
    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            tick_interval: Duration::from_millis(self.tick_ms.max(1)),
            speed: self.speed,
        }
    }
}
