use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use super::context::TabRef;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    TabActivated,
    PageLoaded,
    WindowFocused,
    PageView,
    Interaction,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::TabActivated => "TAB_ACTIVATED",
            EventType::PageLoaded => "PAGE_LOADED",
            EventType::WindowFocused => "WINDOW_FOCUSED",
            EventType::PageView => "PAGE_VIEW",
            EventType::Interaction => "INTERACTION",
        }
    }
}

/// One classified activity, as posted to the collector's ingest endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityEvent {
    pub url: String,
    /// Empty when the page had no title.
    pub title: String,
    pub domain: String,
    pub description: String,
    pub tab_id: TabRef,
    pub event_type: EventType,
    #[serde(serialize_with = "rfc3339")]
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<u64>,
}

fn rfc3339<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}
