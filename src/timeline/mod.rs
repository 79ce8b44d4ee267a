use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::core::{AgentSnapshot, Frame, RawEntry};

/// Errors produced while normalizing a raw timeline
///
/// Policy: a malformed entry fails the whole normalization rather than being
/// silently skipped, so callers of `load()` always see either a complete
/// frame sequence or a descriptive error.
#[derive(Debug, Error)]
pub enum TimelineError {
    #[error("invalid entry {index} (agent {agent:?}, lap {lap}): {reason}")]
    InvalidEntry {
        index: usize,
        agent: String,
        lap: u32,
        reason: String,
    },
}

/// Normalize raw simulator entries into an ordered frame sequence
///
/// - Entries are grouped by lap; laps come out strictly increasing but need
///   not be contiguous.
/// - Within a lap, agents are sorted by ascending position (1 = leader),
///   with the agent id as a tie-break so grouping is stable regardless of
///   input order.
/// - When the simulator repeats an (agent, lap) pair, the last entry wins.
/// - Frame timestamps are frame index x `frame_interval`.
/// - An empty input yields an empty frame sequence; it is not an error.
///
/// Derived fields (`speed`, `position_change`) are left at their zero values
/// here; the metric calculator fills them per transition during playback.
pub fn normalize(entries: &[RawEntry], frame_interval: Duration) -> Result<Vec<Frame>, TimelineError> {
    let mut laps: BTreeMap<u32, Vec<&RawEntry>> = BTreeMap::new();
    for (index, entry) in entries.iter().enumerate() {
        validate(index, entry)?;
        laps.entry(entry.lap).or_default().push(entry);
    }

    let frames: Vec<Frame> = laps
        .into_iter()
        .enumerate()
        .map(|(frame_index, (lap, group))| {
            let mut picked: Vec<&RawEntry> = Vec::with_capacity(group.len());
            let mut seen: HashSet<&str> = HashSet::with_capacity(group.len());
            for entry in group.iter().rev() {
                if seen.insert(entry.agent_id.as_str()) {
                    picked.push(entry);
                }
            }
            picked.sort_by(|a, b| {
                a.position
                    .cmp(&b.position)
                    .then_with(|| a.agent_id.cmp(&b.agent_id))
            });

            let agents = picked
                .into_iter()
                .map(|entry| AgentSnapshot {
                    id: entry.agent_id.clone(),
                    name: entry.display_name().to_string(),
                    position: entry.position,
                    lap_time: entry.lap_time,
                    tyre_wear: entry.tyre_wear,
                    is_pitting: entry.action.is_pit_stop(),
                    speed: 0.0,
                    position_change: 0,
                })
                .collect();

            Frame {
                lap,
                agents,
                timestamp: frame_interval * frame_index as u32,
            }
        })
        .collect();

    debug!("Normalized {} entries into {} frames", entries.len(), frames.len());
    Ok(frames)
}

fn validate(index: usize, entry: &RawEntry) -> Result<(), TimelineError> {
    let fail = |reason: &str| TimelineError::InvalidEntry {
        index,
        agent: entry.agent_id.clone(),
        lap: entry.lap,
        reason: reason.to_string(),
    };

    if entry.agent_id.is_empty() {
        return Err(fail("agent_id must not be empty"));
    }
    if entry.lap == 0 {
        return Err(fail("lap must be positive"));
    }
    if entry.position == 0 {
        return Err(fail("position must be positive"));
    }
    if !entry.lap_time.is_finite() || entry.lap_time < 0.0 {
        return Err(fail("lap_time must be a non-negative number"));
    }
    if !entry.tyre_wear.is_finite() || !(0.0..=100.0).contains(&entry.tyre_wear) {
        return Err(fail("tyre_wear must be within 0-100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Action;

    const INTERVAL: Duration = Duration::from_millis(120);

    fn entry(agent: &str, lap: u32, position: u32) -> RawEntry {
        RawEntry {
            agent_id: agent.to_string(),
            agent_name: None,
            lap,
            position,
            lap_time: 90.0,
            tyre_wear: 10.0,
            action: Action::Maintain,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_sequence() {
        let frames = normalize(&[], INTERVAL).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn test_laps_strictly_increasing_regardless_of_input_order() {
        let entries = vec![
            entry("a", 5, 1),
            entry("a", 1, 1),
            entry("b", 5, 2),
            entry("a", 3, 1),
            entry("b", 1, 2),
            entry("b", 3, 2),
        ];
        let frames = normalize(&entries, INTERVAL).unwrap();
        let laps: Vec<u32> = frames.iter().map(|f| f.lap).collect();
        assert_eq!(laps, vec![1, 3, 5]);
        assert!(laps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_agents_sorted_by_position_within_lap() {
        let entries = vec![entry("b", 1, 2), entry("c", 1, 3), entry("a", 1, 1)];
        let frames = normalize(&entries, INTERVAL).unwrap();
        let order: Vec<&str> = frames[0].agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_position_tie_breaks_by_agent_id() {
        let entries = vec![entry("zulu", 1, 1), entry("alpha", 1, 1)];
        let frames = normalize(&entries, INTERVAL).unwrap();
        let order: Vec<&str> = frames[0].agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["alpha", "zulu"]);
    }

    #[test]
    fn test_duplicate_agent_lap_last_entry_wins() {
        let mut first = entry("a", 1, 1);
        first.tyre_wear = 5.0;
        let mut second = entry("a", 1, 2);
        second.tyre_wear = 40.0;
        let frames = normalize(&[first, second], INTERVAL).unwrap();
        assert_eq!(frames[0].agents.len(), 1);
        assert_eq!(frames[0].agents[0].position, 2);
        assert_eq!(frames[0].agents[0].tyre_wear, 40.0);
    }

    #[test]
    fn test_missing_agent_in_a_lap_is_not_an_error() {
        let entries = vec![
            entry("a", 1, 1),
            entry("c", 1, 2),
            entry("a", 2, 1),
        ];
        let frames = normalize(&entries, INTERVAL).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(frames[0].agent("c").is_some());
        assert!(frames[1].agent("c").is_none());
    }

    #[test]
    fn test_frame_timestamps_follow_interval() {
        let entries = vec![entry("a", 1, 1), entry("a", 4, 1), entry("a", 9, 1)];
        let frames = normalize(&entries, INTERVAL).unwrap();
        assert_eq!(frames[0].timestamp, Duration::ZERO);
        assert_eq!(frames[1].timestamp, INTERVAL);
        assert_eq!(frames[2].timestamp, INTERVAL * 2);
    }

    #[test]
    fn test_pit_action_marks_agent_as_pitting() {
        let mut pitting = entry("a", 1, 1);
        pitting.action = Action::PitStop;
        let frames = normalize(&[pitting, entry("b", 1, 2)], INTERVAL).unwrap();
        assert!(frames[0].agent("a").unwrap().is_pitting);
        assert!(!frames[0].agent("b").unwrap().is_pitting);
    }

    #[test]
    fn test_malformed_entries_fail_normalization() {
        let mut zero_lap = entry("a", 1, 1);
        zero_lap.lap = 0;
        assert!(normalize(&[zero_lap], INTERVAL).is_err());

        let mut negative_time = entry("a", 1, 1);
        negative_time.lap_time = -1.0;
        assert!(normalize(&[negative_time], INTERVAL).is_err());

        let mut nan_wear = entry("a", 1, 1);
        nan_wear.tyre_wear = f64::NAN;
        assert!(normalize(&[nan_wear], INTERVAL).is_err());

        let mut overweared = entry("a", 1, 1);
        overweared.tyre_wear = 140.0;
        assert!(normalize(&[overweared], INTERVAL).is_err());

        let mut anonymous = entry("", 1, 1);
        anonymous.agent_id.clear();
        assert!(normalize(&[anonymous], INTERVAL).is_err());
    }

    #[test]
    fn test_error_message_names_the_entry() {
        let mut bad = entry("ghost", 2, 1);
        bad.position = 0;
        let err = normalize(&[entry("a", 1, 1), bad], INTERVAL).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("entry 1"));
        assert!(message.contains("ghost"));
        assert!(message.contains("position"));
    }
}
