use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

use crate::models::{ActivityEvent, Context, EventType};
use crate::signals::SignalKind;

/// Browser-internal origins never reported.
const INTERNAL_SCHEMES: &[&str] = &[
    "chrome",
    "chrome-extension",
    "edge",
    "about",
    "moz-extension",
    "brave",
    "opera",
    "vivaldi",
];

pub fn is_internal_page(url: &Url) -> bool {
    INTERNAL_SCHEMES.contains(&url.scheme())
}

/// What caused the engine to look at the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A discrete host transition.
    Forced(EventType),
    /// The periodic context poll.
    Poll,
    /// A self-reporting surface's presence ping.
    Interaction,
}

impl Trigger {
    pub fn from_signal(kind: SignalKind) -> Self {
        if kind.is_forced() {
            Trigger::Forced(kind.event_type())
        } else {
            Trigger::Interaction
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            Trigger::Forced(event_type) => *event_type,
            Trigger::Poll => EventType::PageView,
            Trigger::Interaction => EventType::Interaction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Emit,
    InternalPage,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastEmitted {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

/// Decides which resolved contexts become events and measures time on page.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: chrono::Duration,
    last: Option<LastEmitted>,
    page_started_at: DateTime<Utc>,
}

impl Debouncer {
    pub fn new(window: Duration, started_at: DateTime<Utc>) -> Self {
        Self {
            window: chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::days(1)),
            last: None,
            page_started_at: started_at,
        }
    }

    pub fn last_emitted(&self) -> Option<&LastEmitted> {
        self.last.as_ref()
    }

    /// Signals are stamped when the host fires them and may be handled after a
    /// later poll. Clamping keeps the event clock from running backwards.
    pub fn clock(&self, at: DateTime<Utc>) -> DateTime<Utc> {
        at.max(self.page_started_at)
    }

    /// A poll never re-reports the URL that was last emitted, however long the
    /// page stays open. Discrete transitions and pings only collapse within
    /// the window after the last emission.
    pub fn decide(&self, context: &Context, trigger: Trigger, now: DateTime<Utc>) -> Decision {
        if is_internal_page(&context.url) {
            return Decision::InternalPage;
        }

        let Some(last) = &self.last else {
            return Decision::Emit;
        };

        let same_url = last.url == context.url.as_str();
        let within = now.signed_duration_since(last.timestamp) < self.window;

        let duplicate = match trigger {
            Trigger::Forced(_) => same_url && within,
            Trigger::Interaction => within,
            Trigger::Poll => same_url,
        };

        if duplicate {
            Decision::Duplicate
        } else {
            Decision::Emit
        }
    }

    /// Builds the event for a context `decide` let through and restarts the
    /// time-on-page clock.
    pub fn record(
        &mut self,
        context: &Context,
        description: String,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> ActivityEvent {
        let duration_ms = now
            .signed_duration_since(self.page_started_at)
            .num_milliseconds()
            .max(0) as u64;

        self.page_started_at = now;
        self.last = Some(LastEmitted {
            url: context.url.to_string(),
            timestamp: now,
            description: description.clone(),
        });

        ActivityEvent {
            url: context.url.to_string(),
            title: context.title.clone().unwrap_or_default(),
            domain: context.domain().to_string(),
            description,
            tab_id: context.tab,
            event_type: trigger.event_type(),
            timestamp: now,
            duration_ms: Some(duration_ms),
        }
    }
}
