pub mod csv;
pub mod json;

pub use csv::load_csv;
pub use json::load_json;

use anyhow::Result;

use crate::core::RaceTimeline;

/// Input format detection result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
    Unknown,
}

/// Detect the format of an input file from its leading bytes
pub fn detect_format(data: &[u8]) -> InputFormat {
    if is_json(data) {
        return InputFormat::Json;
    }
    if is_csv(data) {
        return InputFormat::Csv;
    }
    InputFormat::Unknown
}

fn is_json(data: &[u8]) -> bool {
    // A timeline document is an object, a bare entry list is an array
    data.iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'{' || *b == b'[')
        .unwrap_or(false)
}

fn is_csv(data: &[u8]) -> bool {
    // Check if the data looks like CSV (text with commas)
    if data.len() < 10 {
        return false;
    }

    let sample = std::str::from_utf8(&data[..data.len().min(500)]);
    match sample {
        Ok(text) => text
            .lines()
            .take(5)
            .any(|line| line.chars().filter(|&c| c == ',').count() >= 2),
        Err(_) => false,
    }
}

/// Load a race timeline from a file, auto-detecting format
pub fn load_file(path: &str) -> Result<RaceTimeline> {
    let data = std::fs::read(path)?;

    match detect_format(&data) {
        InputFormat::Json => load_json(path),
        InputFormat::Csv => load_csv(path),
        InputFormat::Unknown => anyhow::bail!("Unknown input format"),
    }
}
