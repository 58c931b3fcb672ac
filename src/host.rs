//! Host capability boundary: the browser-like environment that owns windows
//! and tabs. The engine only ever queries it; enumerating and delivering
//! notifications is the embedder's job.

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        RwLock,
    },
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub i64);

/// A tab as the host reports it. Every field may be missing for surfaces the
/// host only partially understands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostTab {
    pub id: Option<TabId>,
    pub window_id: Option<WindowId>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostWindow {
    pub id: Option<WindowId>,
    pub focused: bool,
    pub tabs: Vec<HostTab>,
}

#[async_trait]
pub trait BrowserHost: Send + Sync {
    /// Looks up a single tab by id.
    async fn tab(&self, id: TabId) -> Result<Option<HostTab>>;

    /// The tab flagged active in the last-focused window. Cheap.
    async fn active_tab_in_last_focused_window(&self) -> Result<Option<HostTab>>;

    /// Every window with its tabs. Comparatively expensive.
    async fn windows(&self) -> Result<Vec<HostWindow>>;
}

/// Host backed by a window snapshot the embedder replaces whenever the real
/// environment changes. Also counts full enumerations.
#[derive(Debug, Default)]
pub struct SnapshotHost {
    windows: RwLock<Vec<HostWindow>>,
    last_focused: RwLock<Option<WindowId>>,
    enumerations: AtomicUsize,
}

impl SnapshotHost {
    pub fn new(windows: Vec<HostWindow>) -> Self {
        Self {
            windows: RwLock::new(windows),
            ..Self::default()
        }
    }

    pub fn replace(&self, windows: Vec<HostWindow>) -> Result<()> {
        let mut guard = self
            .windows
            .write()
            .map_err(|_| anyhow!("host snapshot lock poisoned"))?;
        *guard = windows;
        Ok(())
    }

    /// Sets the window answered by the cheap active-tab query. `None` makes
    /// that query come back empty, as hosts do for sidebars and panels.
    pub fn set_last_focused(&self, window: Option<WindowId>) -> Result<()> {
        let mut guard = self
            .last_focused
            .write()
            .map_err(|_| anyhow!("host focus lock poisoned"))?;
        *guard = window;
        Ok(())
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::Relaxed)
    }

    fn read_windows(&self) -> Result<Vec<HostWindow>> {
        self.windows
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| anyhow!("host snapshot lock poisoned"))
    }
}

#[async_trait]
impl BrowserHost for SnapshotHost {
    async fn tab(&self, id: TabId) -> Result<Option<HostTab>> {
        Ok(self
            .read_windows()?
            .into_iter()
            .flat_map(|window| window.tabs)
            .find(|tab| tab.id == Some(id)))
    }

    async fn active_tab_in_last_focused_window(&self) -> Result<Option<HostTab>> {
        let focused = *self
            .last_focused
            .read()
            .map_err(|_| anyhow!("host focus lock poisoned"))?;
        let Some(window_id) = focused else {
            return Ok(None);
        };

        Ok(self
            .read_windows()?
            .into_iter()
            .filter(|window| window.id == Some(window_id))
            .flat_map(|window| window.tabs)
            .find(|tab| tab.active))
    }

    async fn windows(&self) -> Result<Vec<HostWindow>> {
        self.enumerations.fetch_add(1, Ordering::Relaxed);
        self.read_windows()
    }
}
