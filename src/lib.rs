pub mod capture;
pub mod classifier;
pub mod collector;
pub mod config;
pub mod host;
pub mod models;
pub mod resolver;
pub mod signals;
pub mod tracking;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};

pub use capture::{CaptureController, CaptureEngine, CaptureHandle, StatusReport};
pub use classifier::classify;
pub use collector::{Collector, CollectorError, HttpCollector};
pub use config::CaptureConfig;
pub use host::{BrowserHost, HostTab, HostWindow, SnapshotHost, TabId, WindowId};
pub use models::{ActivityEvent, Context as ActivityContext, EventType, TabRef};
pub use signals::{Signal, SignalAdapter, SignalKind};
pub use tracking::{format_duration, RemoteStatus, TrackingAction, TrackingState};
pub use utils::init_logging;

/// Wires an [`HttpCollector`] for `config` to `host` and spawns the capture
/// loop. Must be called from inside a tokio runtime.
pub fn start_capture(
    host: Arc<dyn BrowserHost>,
    config: CaptureConfig,
) -> Result<(CaptureController, CaptureHandle)> {
    log::info!("tabtrail starting up...");

    let collector = HttpCollector::new(config.clone()).context("failed to build collector client")?;
    let engine = CaptureEngine::new(host, Arc::new(collector), &config);

    let mut controller = CaptureController::new();
    let handle = controller.start(engine, &config)?;
    Ok((controller, handle))
}
