use serde::{Deserialize, Serialize};

/// A discrete race event attached to the timeline
///
/// Events are display-only side data for the recent-events feed; the
/// playback state machine never consumes them. The wire form is internally
/// tagged on `event_type`, matching the simulator's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum RaceEvent {
    LapComplete {
        agent_id: String,
        agent_name: String,
        #[serde(default)]
        lap: Option<u32>,
        lap_time: f64,
        position: u32,
        #[serde(default)]
        position_change: i32,
        #[serde(default)]
        tyre_wear: f64,
        #[serde(default)]
        timestamp: f64,
    },
    PitStop {
        agent_id: String,
        agent_name: String,
        #[serde(default)]
        lap: Option<u32>,
        position: u32,
        pit_reason: String,
        #[serde(default)]
        pit_stop_time: f64,
        #[serde(default)]
        timestamp: f64,
    },
    Overtake {
        agent_id: String,
        agent_name: String,
        overtaken_agent_name: String,
        overtake_success: bool,
        #[serde(default)]
        lap: Option<u32>,
        position_before: u32,
        position_after: u32,
        #[serde(default)]
        timestamp: f64,
    },
    PrlUpdate {
        agent_id: String,
        agent_name: String,
        prl_reward: f64,
        #[serde(default)]
        lap: Option<u32>,
        #[serde(default)]
        timestamp: f64,
    },
    WeatherChange {
        weather: String,
        #[serde(default)]
        track_temp: Option<f64>,
        #[serde(default)]
        lap: Option<u32>,
        #[serde(default)]
        timestamp: f64,
    },
}

impl RaceEvent {
    /// Lap this event belongs to, when the simulator provided one
    pub fn lap(&self) -> Option<u32> {
        match self {
            RaceEvent::LapComplete { lap, .. }
            | RaceEvent::PitStop { lap, .. }
            | RaceEvent::Overtake { lap, .. }
            | RaceEvent::PrlUpdate { lap, .. }
            | RaceEvent::WeatherChange { lap, .. } => *lap,
        }
    }

    /// Name of the agent the event concerns; weather changes have none
    pub fn agent_name(&self) -> Option<&str> {
        match self {
            RaceEvent::LapComplete { agent_name, .. }
            | RaceEvent::PitStop { agent_name, .. }
            | RaceEvent::Overtake { agent_name, .. }
            | RaceEvent::PrlUpdate { agent_name, .. } => Some(agent_name),
            RaceEvent::WeatherChange { .. } => None,
        }
    }

    /// Short human-readable line for event feeds
    pub fn describe(&self) -> String {
        match self {
            RaceEvent::LapComplete {
                agent_name,
                lap_time,
                position,
                ..
            } => format!("{} completes the lap in {:.2}s (P{})", agent_name, lap_time, position),
            RaceEvent::PitStop {
                agent_name,
                pit_reason,
                pit_stop_time,
                ..
            } => format!("{} pits for {:.1}s ({})", agent_name, pit_stop_time, pit_reason),
            RaceEvent::Overtake {
                agent_name,
                overtaken_agent_name,
                overtake_success: true,
                ..
            } => format!("{} passes {}", agent_name, overtaken_agent_name),
            RaceEvent::Overtake {
                agent_name,
                overtaken_agent_name,
                overtake_success: false,
                ..
            } => format!("{} fails to pass {}", agent_name, overtaken_agent_name),
            RaceEvent::PrlUpdate {
                agent_name,
                prl_reward,
                ..
            } => format!("{} adjusts traits (reward {:+.2})", agent_name, prl_reward),
            RaceEvent::WeatherChange { weather, .. } => format!("Weather turns {}", weather),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagging() {
        let json = r#"{
            "event_type": "pit_stop",
            "agent_id": "a1",
            "agent_name": "Tyre Whisperer",
            "lap": 14,
            "position": 3,
            "pit_reason": "tyre_wear",
            "pit_stop_time": 21.4
        }"#;
        let event: RaceEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.lap(), Some(14));
        assert_eq!(event.agent_name(), Some("Tyre Whisperer"));
        assert!(event.describe().contains("pits"));
    }

    #[test]
    fn test_weather_event_has_no_agent() {
        let json = r#"{"event_type":"weather_change","weather":"light_rain","timestamp":412.0}"#;
        let event: RaceEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.agent_name(), None);
        assert_eq!(event.lap(), None);
    }

    #[test]
    fn test_overtake_roundtrip() {
        let event = RaceEvent::Overtake {
            agent_id: "a1".to_string(),
            agent_name: "Late Braker".to_string(),
            overtaken_agent_name: "Balanced Racer".to_string(),
            overtake_success: true,
            lap: Some(7),
            position_before: 3,
            position_after: 2,
            timestamp: 630.0,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event_type":"overtake""#));
        let back: RaceEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lap(), Some(7));
    }
}
