//! Active-context resolution. Hosts do not reliably report an active tab for
//! every surface (sidebars, panels), so several lookups are tried in order and
//! the first usable tab wins.

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::host::{BrowserHost, HostTab, HostWindow, WindowId};
use crate::models::{Context, TabRef};
use crate::signals::{Signal, SignalKind};

type WindowStrategy = fn(&[HostWindow]) -> Option<HostTab>;

/// Fallbacks over a full window enumeration, most trustworthy first.
const WINDOW_STRATEGIES: &[(&str, WindowStrategy)] = &[
    ("focused-window-active-tab", focused_window_active_tab),
    ("focused-window-first-tab", focused_window_first_tab),
];

/// Resolves the current context for `signal`, or for a periodic poll when
/// `signal` is `None`. `None` means there is nothing to report this cycle.
pub async fn resolve(
    host: &dyn BrowserHost,
    signal: Option<&Signal>,
    now: DateTime<Utc>,
) -> Option<Context> {
    let Some(signal) = signal else {
        let tab = resolve_from_host(host).await?;
        return context_from_tab(tab, now);
    };

    match signal.kind {
        SignalKind::InteractionPing => self_reported(signal),
        SignalKind::PageLoaded if signal.foreground == Some(false) => {
            debug!("ignoring background page load for tab {:?}", signal.tab_id);
            None
        }
        SignalKind::WindowFocused => {
            let window_id = signal.window_id?;
            if let Some(tab) = active_tab_in_window(host, window_id).await {
                return context_from_tab(tab, signal.received_at);
            }
            let tab = resolve_from_host(host).await?;
            context_from_tab(tab, signal.received_at)
        }
        _ => {
            if let Some(tab) = tab_from_signal(host, signal).await {
                return context_from_tab(tab, signal.received_at);
            }
            let tab = resolve_from_host(host).await?;
            context_from_tab(tab, signal.received_at)
        }
    }
}

/// The host-query chain on its own: cheap active-tab lookup first, and only
/// when that comes back empty a full enumeration.
pub async fn resolve_from_host(host: &dyn BrowserHost) -> Option<HostTab> {
    match host.active_tab_in_last_focused_window().await {
        Ok(Some(tab)) if is_usable(&tab) => return Some(tab),
        Ok(_) => {}
        Err(err) => warn!("active tab query failed: {err:#}"),
    }

    let windows = match host.windows().await {
        Ok(windows) => windows,
        Err(err) => {
            warn!("window enumeration failed: {err:#}");
            return None;
        }
    };

    WINDOW_STRATEGIES.iter().find_map(|(name, strategy)| {
        let tab = strategy(&windows)?;
        debug!("resolved active tab via {name}");
        Some(tab)
    })
}

fn focused_window_active_tab(windows: &[HostWindow]) -> Option<HostTab> {
    let window = windows.iter().find(|window| window.focused)?;
    window
        .tabs
        .iter()
        .find(|tab| tab.active && is_usable(tab))
        .cloned()
}

fn focused_window_first_tab(windows: &[HostWindow]) -> Option<HostTab> {
    let window = windows.iter().find(|window| window.focused)?;
    if window.tabs.iter().any(|tab| tab.active) {
        return None;
    }
    window.tabs.first().filter(|tab| is_usable(tab)).cloned()
}

/// The window that just gained focus may not be the host's last-focused one
/// yet, so its active tab is looked up directly.
async fn active_tab_in_window(host: &dyn BrowserHost, window_id: WindowId) -> Option<HostTab> {
    let windows = match host.windows().await {
        Ok(windows) => windows,
        Err(err) => {
            warn!("window enumeration for {window_id:?} failed: {err:#}");
            return None;
        }
    };

    windows
        .into_iter()
        .find(|window| window.id == Some(window_id))?
        .tabs
        .into_iter()
        .find(|tab| tab.active && is_usable(tab))
}

/// Signals that already name a tab skip the active-tab search.
async fn tab_from_signal(host: &dyn BrowserHost, signal: &Signal) -> Option<HostTab> {
    let id = signal.tab_id?;

    if signal.url.is_some() {
        return Some(HostTab {
            id: Some(id),
            window_id: signal.window_id,
            url: signal.url.clone(),
            title: signal.title.clone(),
            active: true,
        });
    }

    match host.tab(id).await {
        Ok(Some(tab)) if is_usable(&tab) => Some(tab),
        Ok(_) => None,
        Err(err) => {
            warn!("tab lookup for {id} failed: {err:#}");
            None
        }
    }
}

fn self_reported(signal: &Signal) -> Option<Context> {
    let raw = signal.url.as_deref()?;
    let context = Context::parse(
        raw,
        signal.title.clone(),
        TabRef::from(signal.tab_id),
        signal.received_at,
    );
    if context.is_none() {
        warn!("dropping self-report with invalid url {raw:?}");
    }
    context
}

fn context_from_tab(tab: HostTab, now: DateTime<Utc>) -> Option<Context> {
    let raw = tab.url.as_deref()?;
    let context = Context::parse(raw, tab.title.clone(), TabRef::from(tab.id), now);
    if context.is_none() {
        warn!("dropping tab {:?} with invalid url {raw:?}", tab.id);
    }
    context
}

fn is_usable(tab: &HostTab) -> bool {
    tab.id.is_some() && tab.url.as_deref().is_some_and(|url| !url.is_empty())
}
