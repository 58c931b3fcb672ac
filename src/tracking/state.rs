use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackingState {
    Active,
    Paused,
    #[default]
    Stopped,
}

impl TrackingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingState::Active => "ACTIVE",
            TrackingState::Paused => "PAUSED",
            TrackingState::Stopped => "STOPPED",
        }
    }
}

/// User-issued control commands. The collector decides whether they are legal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrackingAction {
    Start,
    Pause,
    Resume,
    Stop,
}

impl TrackingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingAction::Start => "start",
            TrackingAction::Pause => "pause",
            TrackingAction::Resume => "resume",
            TrackingAction::Stop => "stop",
        }
    }

    /// State assumed locally until the collector says otherwise.
    pub fn optimistic_state(&self) -> TrackingState {
        match self {
            TrackingAction::Start | TrackingAction::Resume => TrackingState::Active,
            TrackingAction::Pause => TrackingState::Paused,
            TrackingAction::Stop => TrackingState::Stopped,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CurrentWindow {
    pub app_name: String,
    pub title: String,
}

/// The collector's authoritative view of tracking, as served by its status
/// endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteStatus {
    pub state: TrackingState,
    #[serde(default)]
    pub last_active_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub idle_seconds: u64,
    #[serde(default)]
    pub current_window: Option<CurrentWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_time_seconds: Option<u64>,
}

/// Idle time shorter than this is not worth showing.
const IDLE_LABEL_THRESHOLD_SECS: u64 = 60;

impl RemoteStatus {
    pub fn idle_label(&self) -> Option<String> {
        (self.idle_seconds > IDLE_LABEL_THRESHOLD_SECS)
            .then(|| format!("Idle for {}", format_duration(self.idle_seconds)))
    }
}

/// `"1h 5m"`, `"12m"`, or `"0m"`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_collector_status_payload() {
        let status: RemoteStatus = serde_json::from_value(serde_json::json!({
            "state": "PAUSED",
            "last_active_at": "2026-03-01T09:00:00Z",
            "idle_seconds": 125,
            "current_window": {"app_name": "Code", "title": "main.rs"},
            "unrelated": true
        }))
        .unwrap();

        assert_eq!(status.state, TrackingState::Paused);
        assert_eq!(status.current_window.unwrap().app_name, "Code");
        assert!(status.last_active_at.is_some());
        assert_eq!(status.today_time_seconds, None);
    }

    #[test]
    fn tolerates_nulls_and_rejects_unknown_states() {
        let status: RemoteStatus = serde_json::from_value(serde_json::json!({
            "state": "STOPPED",
            "last_active_at": null,
            "idle_seconds": 0,
            "current_window": null
        }))
        .unwrap();
        assert_eq!(status.state, TrackingState::Stopped);

        assert!(serde_json::from_value::<RemoteStatus>(serde_json::json!({"state": "IDLE"})).is_err());
    }

    #[test]
    fn duration_labels() {
        assert_eq!(format_duration(0), "0m");
        assert_eq!(format_duration(720), "12m");
        assert_eq!(format_duration(3_900), "1h 5m");

        let mut status = RemoteStatus {
            state: TrackingState::Active,
            last_active_at: None,
            idle_seconds: 60,
            current_window: None,
            today_time_seconds: None,
        };
        assert_eq!(status.idle_label(), None);
        status.idle_seconds = 300;
        assert_eq!(status.idle_label().as_deref(), Some("Idle for 5m"));
    }
}
