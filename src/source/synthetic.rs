use async_trait::async_trait;
use tracing::debug;

use crate::core::{Action, RaceEvent, RaceTimeline, RawEntry};
use crate::metrics::XorShiftRng;
use crate::source::{SourceResult, TimelineSource};

/// Baseline lap time for the synthetic track, seconds
const BASE_LAP_SECS: f64 = 90.0;

/// Tyre wear percentage past which an agent is forced to pit
const PIT_WEAR_THRESHOLD: f64 = 72.0;

/// Time lost to a pit stop, seconds (plus noise)
const PIT_PENALTY_SECS: f64 = 22.0;

/// Built-in agent profile
struct Profile {
    id: &'static str,
    name: &'static str,
    aggression: f64,
    tyre_management: f64,
}

const PROFILES: &[Profile] = &[
    Profile {
        id: "aggressive_overtaker",
        name: "Aggressive Overtaker",
        aggression: 0.9,
        tyre_management: 0.4,
    },
    Profile {
        id: "tyre_whisperer",
        name: "Tyre Whisperer",
        aggression: 0.4,
        tyre_management: 0.95,
    },
    Profile {
        id: "balanced_racer",
        name: "Balanced Racer",
        aggression: 0.55,
        tyre_management: 0.65,
    },
    Profile {
        id: "late_braker",
        name: "Late Braker",
        aggression: 0.75,
        tyre_management: 0.5,
    },
];

/// Synthetic timeline source for demos and tests without a simulator
///
/// Generates a plausible race for the built-in agent roster: lap times per
/// action, accumulating tyre wear, forced pit stops past a wear threshold,
/// and the matching event feed. Deterministic: the same seed produces the
/// same timeline.
pub struct SyntheticSource {
    laps: u32,
    rng: XorShiftRng,
}

impl SyntheticSource {
    pub fn new(laps: u32, seed: u64) -> Self {
        Self {
            laps,
            rng: XorShiftRng::new(seed),
        }
    }

    fn pick_action(&mut self, wear: f64, aggression: f64) -> Action {
        if wear >= PIT_WEAR_THRESHOLD {
            return Action::PitStop;
        }
        let roll = self.rng.next_f64();
        if roll < aggression * 0.35 {
            Action::PushHard
        } else if roll < aggression * 0.6 {
            Action::PushMedium
        } else if roll < 0.85 {
            Action::Maintain
        } else {
            Action::ConserveMedium
        }
    }

    fn lap_time_for(&mut self, action: Action, aggression: f64) -> f64 {
        let modifier = match action {
            Action::PushHard => -1.5 - aggression * 0.5,
            Action::PushMedium => -0.8 - aggression * 0.3,
            Action::ConserveLow => 0.6,
            Action::ConserveMedium => 1.2,
            Action::ConserveHigh => 2.2,
            Action::PitStop => PIT_PENALTY_SECS + self.rng.range_f64(-1.5, 1.5),
            Action::Maintain | Action::None => 0.0,
        };
        let noise = self.rng.range_f64(-0.15, 0.15);
        (BASE_LAP_SECS + modifier + noise).max(10.0)
    }

    fn wear_increment(action: Action, tyre_management: f64) -> f64 {
        let multiplier = match action {
            Action::PushHard => 1.6,
            Action::PushMedium => 1.2,
            Action::ConserveLow => 0.8,
            Action::ConserveMedium => 0.6,
            Action::ConserveHigh => 0.45,
            Action::Maintain | Action::None | Action::PitStop => 1.0,
        };
        // 3% per lap baseline, reduced by tyre management
        3.0 * multiplier * (1.0 - 0.4 * tyre_management)
    }

    fn generate(&mut self) -> RaceTimeline {
        let mut entries = Vec::new();
        let mut events = Vec::new();

        let mut wear = vec![0.0f64; PROFILES.len()];
        let mut positions: Vec<u32> = (1..=PROFILES.len() as u32).collect();

        for lap in 1..=self.laps {
            if self.rng.next_f64() < 0.06 {
                events.push(RaceEvent::WeatherChange {
                    weather: if self.rng.next_f64() < 0.5 {
                        "light_rain".to_string()
                    } else {
                        "dry".to_string()
                    },
                    track_temp: None,
                    lap: Some(lap),
                    timestamp: (lap - 1) as f64 * BASE_LAP_SECS,
                });
            }

            // Simulate each agent's lap, then rank by lap time for positions
            let mut results: Vec<(usize, Action, f64)> = Vec::with_capacity(PROFILES.len());
            for (idx, profile) in PROFILES.iter().enumerate() {
                let action = self.pick_action(wear[idx], profile.aggression);
                let lap_time = self.lap_time_for(action, profile.aggression);
                if action == Action::PitStop {
                    wear[idx] = 2.0; // fresh tyres, small out-lap wear
                } else {
                    wear[idx] =
                        (wear[idx] + Self::wear_increment(action, profile.tyre_management)).min(100.0);
                }
                results.push((idx, action, lap_time));
            }
            results.sort_by(|a, b| a.2.total_cmp(&b.2));

            for (rank, (idx, action, lap_time)) in results.iter().enumerate() {
                let profile = &PROFILES[*idx];
                let position = (rank + 1) as u32;
                let previous_position = positions[*idx];
                let timestamp = (lap - 1) as f64 * BASE_LAP_SECS + lap_time;

                if *action == Action::PitStop {
                    events.push(RaceEvent::PitStop {
                        agent_id: profile.id.to_string(),
                        agent_name: profile.name.to_string(),
                        lap: Some(lap),
                        position,
                        pit_reason: "tyre_wear".to_string(),
                        pit_stop_time: lap_time - BASE_LAP_SECS,
                        timestamp,
                    });
                }

                if position < previous_position {
                    // Credit the pass against the agent now directly behind
                    if let Some((behind_idx, ..)) = results.get(rank + 1) {
                        events.push(RaceEvent::Overtake {
                            agent_id: profile.id.to_string(),
                            agent_name: profile.name.to_string(),
                            overtaken_agent_name: PROFILES[*behind_idx].name.to_string(),
                            overtake_success: true,
                            lap: Some(lap),
                            position_before: previous_position,
                            position_after: position,
                            timestamp,
                        });
                    }
                }

                events.push(RaceEvent::LapComplete {
                    agent_id: profile.id.to_string(),
                    agent_name: profile.name.to_string(),
                    lap: Some(lap),
                    lap_time: *lap_time,
                    position,
                    position_change: previous_position as i32 - position as i32,
                    tyre_wear: wear[*idx],
                    timestamp,
                });

                entries.push(RawEntry {
                    agent_id: profile.id.to_string(),
                    agent_name: Some(profile.name.to_string()),
                    lap,
                    position,
                    lap_time: *lap_time,
                    tyre_wear: wear[*idx],
                    action: *action,
                });

                positions[*idx] = position;
            }
        }

        debug!(
            "Generated synthetic race: {} laps, {} entries, {} events",
            self.laps,
            entries.len(),
            events.len()
        );
        RaceTimeline { entries, events }
    }
}

#[async_trait]
impl TimelineSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn fetch(&mut self) -> SourceResult<RaceTimeline> {
        Ok(self.generate())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::normalize;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_seed_same_timeline() {
        let a = SyntheticSource::new(10, 42).fetch().await.unwrap();
        let b = SyntheticSource::new(10, 42).fetch().await.unwrap();
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[tokio::test]
    async fn test_different_seeds_differ() {
        let a = SyntheticSource::new(10, 1).fetch().await.unwrap();
        let b = SyntheticSource::new(10, 2).fetch().await.unwrap();
        assert_ne!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }

    #[tokio::test]
    async fn test_generated_timeline_normalizes_cleanly() {
        let timeline = SyntheticSource::new(30, 7).fetch().await.unwrap();
        let frames = normalize(&timeline.entries, Duration::from_millis(120)).unwrap();
        assert_eq!(frames.len(), 30);
        for frame in &frames {
            assert_eq!(frame.agents.len(), PROFILES.len());
            let positions: Vec<u32> = frame.agents.iter().map(|a| a.position).collect();
            assert_eq!(positions, vec![1, 2, 3, 4]);
        }
    }

    #[tokio::test]
    async fn test_long_race_produces_pit_stops() {
        let timeline = SyntheticSource::new(40, 3).fetch().await.unwrap();
        let pits = timeline
            .entries
            .iter()
            .filter(|e| e.action == Action::PitStop)
            .count();
        assert!(pits > 0, "a 40-lap race should force at least one pit stop");
        assert!(timeline
            .events
            .iter()
            .any(|e| matches!(e, RaceEvent::PitStop { .. })));
    }

    #[tokio::test]
    async fn test_zero_laps_is_empty_not_an_error() {
        let timeline = SyntheticSource::new(0, 9).fetch().await.unwrap();
        assert!(timeline.entries.is_empty());
        assert!(timeline.events.is_empty());
    }
}
