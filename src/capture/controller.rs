use anyhow::{anyhow, bail, Context, Result};
use log::info;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CaptureConfig;
use crate::host::HostWindow;
use crate::signals::{signal_channel, SignalAdapter};
use crate::tracking::TrackingAction;

use super::engine::{CaptureEngine, StatusReport};
use super::loop_worker::{capture_loop, EngineRequest, LoopChannels};

const REQUEST_BUFFER: usize = 16;

#[derive(Default)]
pub struct CaptureController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl CaptureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawns the capture loop around `engine` and returns the handle
    /// consumers and host callbacks talk to.
    pub fn start(&mut self, engine: CaptureEngine, config: &CaptureConfig) -> Result<CaptureHandle> {
        if self.handle.is_some() {
            bail!("capture already running");
        }

        let (adapter, signals) = signal_channel(config.signal_buffer);
        let (request_tx, requests) = mpsc::channel(REQUEST_BUFFER);
        let (status_tx, status_rx) = watch::channel(engine.report());

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        info!("starting capture against {}", config.api_base);
        let handle = tokio::spawn(capture_loop(
            engine,
            LoopChannels {
                signals,
                requests,
                status: status_tx,
            },
            config.poll_interval(),
            config.reconcile_interval(),
            token_clone,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);

        Ok(CaptureHandle {
            requests: request_tx,
            status: status_rx,
            signals: adapter,
        })
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("capture loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

/// Cloneable front door to a running capture loop.
#[derive(Debug, Clone)]
pub struct CaptureHandle {
    requests: mpsc::Sender<EngineRequest>,
    status: watch::Receiver<StatusReport>,
    signals: SignalAdapter,
}

impl CaptureHandle {
    /// Latest published status. Never waits on the loop.
    pub fn status(&self) -> StatusReport {
        self.status.borrow().clone()
    }

    /// Resolves on the next status change.
    pub async fn changed(&mut self) -> Result<StatusReport> {
        self.status
            .changed()
            .await
            .map_err(|_| anyhow!("capture loop is not running"))?;
        Ok(self.status.borrow_and_update().clone())
    }

    pub fn signals(&self) -> SignalAdapter {
        self.signals.clone()
    }

    pub async fn start_tracking(&self) -> Result<StatusReport> {
        self.command(TrackingAction::Start).await
    }

    pub async fn pause_tracking(&self) -> Result<StatusReport> {
        self.command(TrackingAction::Pause).await
    }

    pub async fn resume_tracking(&self) -> Result<StatusReport> {
        self.command(TrackingAction::Resume).await
    }

    pub async fn stop_tracking(&self) -> Result<StatusReport> {
        self.command(TrackingAction::Stop).await
    }

    /// Forces a reconciliation now instead of waiting for the timer.
    pub async fn check_collector(&self) -> Result<StatusReport> {
        self.request(EngineRequest::CheckCollector).await
    }

    pub async fn debug_windows(&self) -> Result<Vec<HostWindow>> {
        self.request(EngineRequest::DebugWindows).await?
    }

    async fn command(&self, action: TrackingAction) -> Result<StatusReport> {
        self.request(|reply| EngineRequest::Command(action, reply))
            .await
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(build(reply_tx))
            .await
            .map_err(|_| anyhow!("capture loop is not running"))?;
        reply_rx
            .await
            .context("capture loop dropped the request")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::HttpCollector;
    use crate::host::SnapshotHost;
    use std::sync::Arc;

    fn unreachable_engine(config: &CaptureConfig) -> CaptureEngine {
        let collector = HttpCollector::new(config.clone()).unwrap();
        CaptureEngine::new(Arc::new(SnapshotHost::default()), Arc::new(collector), config)
    }

    fn config() -> CaptureConfig {
        CaptureConfig {
            // Nothing listens on port 9 locally; connections are refused.
            api_base: "http://127.0.0.1:9".into(),
            health_timeout_ms: 200,
            request_timeout_ms: 200,
            ..CaptureConfig::default()
        }
    }

    #[tokio::test]
    async fn refuses_to_start_twice() {
        let config = config();
        let mut controller = CaptureController::new();
        controller.start(unreachable_engine(&config), &config).unwrap();
        assert!(controller
            .start(unreachable_engine(&config), &config)
            .is_err());
        controller.stop().await.unwrap();
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn commands_against_a_dead_collector_leave_tracking_stopped() {
        let config = config();
        let mut controller = CaptureController::new();
        let handle = controller.start(unreachable_engine(&config), &config).unwrap();

        let report = handle.start_tracking().await.unwrap();
        assert!(!report.reachable);
        assert_eq!(report.state, crate::tracking::TrackingState::Stopped);

        controller.stop().await.unwrap();
        assert!(handle.check_collector().await.is_err());
    }
}
