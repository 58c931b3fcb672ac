use log::{info, warn};
use serde::Serialize;

use crate::collector::{Collector, CollectorResult};

use super::{RemoteStatus, TrackingAction, TrackingState};

/// Outcome of one round-trip to the collector's health and status endpoints.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Confirmed(RemoteStatus),
    Failed,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStatus {
    pub state: TrackingState,
    pub reachable: bool,
    pub snapshot: Option<RemoteStatus>,
}

/// Local, advisory copy of the collector's tracking state.
///
/// Two entry points change it: [`apply_optimistic`](Self::apply_optimistic)
/// for user commands and [`apply_authoritative`](Self::apply_authoritative)
/// for reconciliation. The latter always wins; an optimistic value only lasts
/// until the next authoritative read.
#[derive(Debug, Clone, Default)]
pub struct TrackingMachine {
    state: TrackingState,
    reachable: bool,
    snapshot: Option<RemoteStatus>,
}

impl TrackingMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn reachable(&self) -> bool {
        self.reachable
    }

    pub fn snapshot(&self) -> Option<&RemoteStatus> {
        self.snapshot.as_ref()
    }

    pub fn status(&self) -> TrackingStatus {
        TrackingStatus {
            state: self.state,
            reachable: self.reachable,
            snapshot: self.snapshot.clone(),
        }
    }

    /// Events are only built while tracking is active and the collector is up.
    pub fn can_emit(&self) -> bool {
        self.state == TrackingState::Active && self.reachable
    }

    pub fn apply_optimistic(&mut self, action: TrackingAction) -> TrackingState {
        self.state = action.optimistic_state();
        self.state
    }

    /// On failure the last known state is kept; only reachability and the
    /// retained snapshot are reset.
    pub fn apply_authoritative(&mut self, outcome: Reconciliation) {
        match outcome {
            Reconciliation::Confirmed(status) => {
                if !self.reachable {
                    info!("collector reachable, tracking {}", status.state.as_str());
                }
                self.state = status.state;
                self.reachable = true;
                self.snapshot = Some(status);
            }
            Reconciliation::Failed => {
                if self.reachable {
                    warn!("collector unreachable; holding state {}", self.state.as_str());
                }
                self.reachable = false;
                self.snapshot = None;
            }
        }
    }

    /// Backpressure after a failed ingest: gate emits until the next
    /// successful reconciliation.
    pub fn mark_unreachable(&mut self) {
        self.reachable = false;
    }

    pub async fn reconcile(&mut self, collector: &dyn Collector) -> TrackingStatus {
        let outcome = match fetch_status(collector).await {
            Ok(status) => Reconciliation::Confirmed(status),
            Err(err) => {
                log::debug!("reconciliation failed: {err}");
                Reconciliation::Failed
            }
        };
        self.apply_authoritative(outcome);
        self.status()
    }

    /// Sends `action` and reconciles. Rejections are not errors: the
    /// reconciliation that follows restores whatever the collector accepted.
    /// While the collector is unreachable the command is held back unless a
    /// fresh reconciliation brings it back.
    pub async fn command(
        &mut self,
        collector: &dyn Collector,
        action: TrackingAction,
    ) -> TrackingStatus {
        if !self.reachable && !self.reconcile(collector).await.reachable {
            warn!("collector unreachable; not sending {}", action.as_str());
            return self.status();
        }

        self.apply_optimistic(action);
        if let Err(err) = collector.command(action).await {
            warn!("tracking {} not accepted: {err}", action.as_str());
        }
        self.reconcile(collector).await
    }
}

async fn fetch_status(collector: &dyn Collector) -> CollectorResult<RemoteStatus> {
    collector.health().await?;
    collector.status().await
}
