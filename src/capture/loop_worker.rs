use anyhow::Result;
use chrono::Utc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::host::HostWindow;
use crate::signals::SignalStream;
use crate::tracking::TrackingAction;

use super::engine::{CaptureEngine, StatusReport};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_info, log_warn};

/// Requests from [`CaptureHandle`](super::CaptureHandle) into the loop.
#[derive(Debug)]
pub enum EngineRequest {
    Command(TrackingAction, oneshot::Sender<StatusReport>),
    CheckCollector(oneshot::Sender<StatusReport>),
    DebugWindows(oneshot::Sender<Result<Vec<HostWindow>>>),
}

pub struct LoopChannels {
    pub signals: SignalStream,
    pub requests: mpsc::Receiver<EngineRequest>,
    pub status: watch::Sender<StatusReport>,
}

pub async fn capture_loop(
    mut engine: CaptureEngine,
    channels: LoopChannels,
    poll_every: Duration,
    reconcile_every: Duration,
    cancel_token: CancellationToken,
) {
    let LoopChannels {
        mut signals,
        mut requests,
        status,
    } = channels;

    let mut poll_ticker = interval(poll_every);
    poll_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the immediate poll; reconciliation has to open the gate first.
    poll_ticker.reset();

    // First tick fires immediately: the start-up reconciliation.
    let mut reconcile_ticker = interval(reconcile_every);
    reconcile_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut signals_open = true;
    let mut requests_open = true;

    log_info!(
        "capture loop started (poll {}ms, reconcile {}ms)",
        poll_every.as_millis(),
        reconcile_every.as_millis()
    );

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_info!("capture loop shutting down");
                break;
            }
            request = requests.recv(), if requests_open => {
                match request {
                    Some(request) => handle_request(&mut engine, request).await,
                    None => {
                        log_debug!("all capture handles dropped");
                        requests_open = false;
                    }
                }
            }
            signal = signals.next(), if signals_open => {
                match signal {
                    Some(signal) => {
                        engine.handle_signal(signal).await;
                    }
                    None => {
                        log_warn!("signal stream closed; continuing on polls only");
                        signals_open = false;
                    }
                }
            }
            _ = poll_ticker.tick() => {
                engine.poll(Utc::now()).await;
            }
            _ = reconcile_ticker.tick() => {
                engine.reconcile().await;
            }
        }

        status.send_if_modified(|current| {
            let next = engine.report();
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

async fn handle_request(engine: &mut CaptureEngine, request: EngineRequest) {
    match request {
        EngineRequest::Command(action, reply) => {
            let report = engine.command(action).await;
            let _ = reply.send(report);
        }
        EngineRequest::CheckCollector(reply) => {
            let report = engine.reconcile().await;
            let _ = reply.send(report);
        }
        EngineRequest::DebugWindows(reply) => {
            let _ = reply.send(engine.debug_windows().await);
        }
    }
}
