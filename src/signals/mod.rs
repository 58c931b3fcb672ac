//! Uniform shape for host notifications. Signals are built per notification
//! and consumed right away; missing host data stays as `None` so the
//! resolver can decide what to do with it.

pub mod adapter;

pub use adapter::{signal_channel, SignalAdapter, SignalStream};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::host::{HostTab, TabId, WindowId};
use crate::models::EventType;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SignalKind {
    TabActivated,
    PageLoaded,
    WindowFocused,
    /// Self-report from a surface the host cannot enumerate.
    InteractionPing,
}

impl SignalKind {
    /// Discrete host transitions bypass the same-URL debounce.
    pub fn is_forced(&self) -> bool {
        !matches!(self, SignalKind::InteractionPing)
    }

    pub fn event_type(&self) -> EventType {
        match self {
            SignalKind::TabActivated => EventType::TabActivated,
            SignalKind::PageLoaded => EventType::PageLoaded,
            SignalKind::WindowFocused => EventType::WindowFocused,
            SignalKind::InteractionPing => EventType::Interaction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub kind: SignalKind,
    pub tab_id: Option<TabId>,
    pub window_id: Option<WindowId>,
    pub url: Option<String>,
    pub title: Option<String>,
    /// Whether the host considered the tab foreground when it notified us.
    pub foreground: Option<bool>,
    pub received_at: DateTime<Utc>,
}

impl Signal {
    fn bare(kind: SignalKind, received_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            tab_id: None,
            window_id: None,
            url: None,
            title: None,
            foreground: None,
            received_at,
        }
    }

    pub fn tab_activated(tab_id: TabId, received_at: DateTime<Utc>) -> Self {
        Self {
            tab_id: Some(tab_id),
            ..Self::bare(SignalKind::TabActivated, received_at)
        }
    }

    pub fn page_loaded(tab: &HostTab, received_at: DateTime<Utc>) -> Self {
        Self {
            tab_id: tab.id,
            window_id: tab.window_id,
            url: tab.url.clone(),
            title: tab.title.clone(),
            foreground: Some(tab.active),
            ..Self::bare(SignalKind::PageLoaded, received_at)
        }
    }

    /// `window_id` is `None` when focus left the browser entirely.
    pub fn window_focused(window_id: Option<WindowId>, received_at: DateTime<Utc>) -> Self {
        Self {
            window_id,
            ..Self::bare(SignalKind::WindowFocused, received_at)
        }
    }

    pub fn interaction(
        url: impl Into<String>,
        title: Option<String>,
        received_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: Some(url.into()),
            title,
            ..Self::bare(SignalKind::InteractionPing, received_at)
        }
    }
}
