use anyhow::{Context, Result};

use crate::core::{RaceTimeline, RawEntry};

/// Load a race timeline from a JSON file
///
/// Accepts either a full timeline document
/// (`{"entries": [...], "events": [...]}`) or a bare array of entries, which
/// is what some simulator exports produce.
pub fn load_json(path: &str) -> Result<RaceTimeline> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path))?;
    parse_json(&contents).with_context(|| format!("Failed to parse timeline from {}", path))
}

/// Parse a timeline from JSON text
pub fn parse_json(contents: &str) -> Result<RaceTimeline> {
    match contents.trim_start().chars().next() {
        Some('[') => {
            let entries: Vec<RawEntry> =
                serde_json::from_str(contents).context("Invalid entry array")?;
            Ok(RaceTimeline {
                entries,
                events: Vec::new(),
            })
        }
        _ => serde_json::from_str(contents).context("Invalid timeline document"),
    }
}
