use anyhow::{anyhow, Result};
use chrono::Utc;
use tokio::sync::mpsc;

use crate::host::{HostTab, TabId, WindowId};

use super::Signal;

/// Creates the single subscription point: hosts push through the adapter,
/// the capture loop drains the stream.
pub fn signal_channel(capacity: usize) -> (SignalAdapter, SignalStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (SignalAdapter { tx }, SignalStream { rx })
}

/// Turns host notifications into [`Signal`]s. Cheap to clone; hand one to
/// each host callback.
#[derive(Debug, Clone)]
pub struct SignalAdapter {
    tx: mpsc::Sender<Signal>,
}

impl SignalAdapter {
    pub async fn emit(&self, signal: Signal) -> Result<()> {
        self.tx
            .send(signal)
            .await
            .map_err(|_| anyhow!("capture loop is not running"))
    }

    /// Non-blocking variant for synchronous host callbacks.
    pub fn try_emit(&self, signal: Signal) -> Result<()> {
        self.tx.try_send(signal).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => anyhow!("signal buffer full"),
            mpsc::error::TrySendError::Closed(_) => anyhow!("capture loop is not running"),
        })
    }

    pub async fn tab_activated(&self, tab_id: TabId) -> Result<()> {
        self.emit(Signal::tab_activated(tab_id, Utc::now())).await
    }

    /// Call once a tab has finished loading.
    pub async fn page_loaded(&self, tab: &HostTab) -> Result<()> {
        self.emit(Signal::page_loaded(tab, Utc::now())).await
    }

    pub async fn window_focused(&self, window_id: Option<WindowId>) -> Result<()> {
        self.emit(Signal::window_focused(window_id, Utc::now())).await
    }

    /// Presence report from a surface that talks to us directly.
    pub async fn interaction(&self, url: impl Into<String>, title: Option<String>) -> Result<()> {
        self.emit(Signal::interaction(url, title, Utc::now())).await
    }
}

#[derive(Debug)]
pub struct SignalStream {
    rx: mpsc::Receiver<Signal>,
}

impl SignalStream {
    /// `None` once every adapter has been dropped.
    pub async fn next(&mut self) -> Option<Signal> {
        self.rx.recv().await
    }
}
