use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::core::{Action, RaceTimeline, RawEntry};

/// Load a race timeline from a CSV lap log
///
/// Supports flexible column namings, e.g.:
/// - agent_id,lap,position,lap_time,tyre_wear
/// - driver,lap,pos,time,wear,action
///
/// The `agent_name` and `action` columns are optional; events cannot be
/// carried in CSV form and come back empty.
pub fn load_csv(path: &str) -> Result<RaceTimeline> {
    let file_path = Path::new(path);
    let mut rdr = csv::Reader::from_path(file_path)
        .with_context(|| format!("Failed to open {}", path))?;

    let headers = rdr.headers()?.clone();
    let columns = detect_columns(&headers)?;

    let mut entries = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", row + 1))?;
        let entry = parse_record(&record, &columns)
            .with_context(|| format!("Invalid CSV row {}", row + 1))?;
        entries.push(entry);
    }

    debug!("Loaded {} entries from {}", entries.len(), path);
    Ok(RaceTimeline {
        entries,
        events: Vec::new(),
    })
}

struct Columns {
    agent: usize,
    name: Option<usize>,
    lap: usize,
    position: usize,
    lap_time: usize,
    tyre_wear: usize,
    action: Option<usize>,
}

/// Detect column indices from CSV headers
fn detect_columns(headers: &csv::StringRecord) -> Result<Columns> {
    Ok(Columns {
        agent: find_column(headers, &["agent_id", "agent", "driver", "id"])?,
        name: find_optional(headers, &["agent_name", "name"]),
        lap: find_column(headers, &["lap", "lap_number", "lap_num"])?,
        position: find_column(headers, &["position", "pos", "rank"])?,
        lap_time: find_column(headers, &["lap_time", "laptime", "time"])?,
        tyre_wear: find_column(headers, &["tyre_wear", "tire_wear", "wear"])?,
        action: find_optional(headers, &["action"]),
    })
}

/// Find a column by checking possible names
fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Result<usize> {
    find_optional(headers, names)
        .with_context(|| format!("Could not find column with names: {:?}", names))
}

fn find_optional(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header_lower = header.to_lowercase();
        names.iter().any(|&name| header_lower == name)
    })
}

fn parse_record(record: &csv::StringRecord, columns: &Columns) -> Result<RawEntry> {
    let field = |idx: usize, what: &str| {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("Missing {} column", what))
    };

    let agent_id = field(columns.agent, "agent")?.to_string();
    let agent_name = columns
        .name
        .and_then(|idx| record.get(idx))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let lap = field(columns.lap, "lap")?
        .parse::<u32>()
        .context("Failed to parse lap")?;
    let position = field(columns.position, "position")?
        .parse::<u32>()
        .context("Failed to parse position")?;
    let lap_time = field(columns.lap_time, "lap_time")?
        .parse::<f64>()
        .context("Failed to parse lap_time")?;
    let tyre_wear = field(columns.tyre_wear, "tyre_wear")?
        .parse::<f64>()
        .context("Failed to parse tyre_wear")?;

    let action = match columns.action.and_then(|idx| record.get(idx)).map(str::trim) {
        Some("") | None => Action::default(),
        Some(raw) => raw
            .parse::<Action>()
            .map_err(|e| anyhow::anyhow!("Failed to parse action: {}", e))?,
    };

    Ok(RawEntry {
        agent_id,
        agent_name,
        lap,
        position,
        lap_time,
        tyre_wear,
        action,
    })
}
