use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use crate::classifier::classify;
use crate::collector::Collector;
use crate::config::CaptureConfig;
use crate::host::{BrowserHost, HostWindow};
use crate::models::{ActivityEvent, Context};
use crate::resolver;
use crate::signals::Signal;
use crate::tracking::{RemoteStatus, TrackingAction, TrackingMachine, TrackingState};

use super::debounce::{Debouncer, Decision, LastEmitted, Trigger};

/// What consumers see of the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub state: TrackingState,
    pub reachable: bool,
    pub last_emitted: Option<LastEmitted>,
    pub snapshot: Option<RemoteStatus>,
}

/// Sole owner of debouncer and tracking state. Each reaction runs to
/// completion before the next one starts; the capture loop guarantees that by
/// holding the engine by value.
pub struct CaptureEngine {
    host: Arc<dyn BrowserHost>,
    collector: Arc<dyn Collector>,
    debouncer: Debouncer,
    tracking: TrackingMachine,
}

impl CaptureEngine {
    pub fn new(
        host: Arc<dyn BrowserHost>,
        collector: Arc<dyn Collector>,
        config: &CaptureConfig,
    ) -> Self {
        Self {
            host,
            collector,
            debouncer: Debouncer::new(config.debounce(), Utc::now()),
            tracking: TrackingMachine::new(),
        }
    }

    pub fn report(&self) -> StatusReport {
        StatusReport {
            state: self.tracking.state(),
            reachable: self.tracking.reachable(),
            last_emitted: self.debouncer.last_emitted().cloned(),
            snapshot: self.tracking.snapshot().cloned(),
        }
    }

    /// Reacts to a host notification. Returns the event that was sent, if any.
    pub async fn handle_signal(&mut self, signal: Signal) -> Option<ActivityEvent> {
        if !self.gate_open() {
            return None;
        }

        let now = self.debouncer.clock(signal.received_at);
        let context = resolver::resolve(self.host.as_ref(), Some(&signal), now).await?;
        self.capture(context, Trigger::from_signal(signal.kind), now)
            .await
    }

    /// The periodic context poll.
    pub async fn poll(&mut self, now: DateTime<Utc>) -> Option<ActivityEvent> {
        if !self.gate_open() {
            return None;
        }

        let now = self.debouncer.clock(now);
        let context = resolver::resolve(self.host.as_ref(), None, now).await?;
        self.capture(context, Trigger::Poll, now).await
    }

    pub async fn reconcile(&mut self) -> StatusReport {
        self.tracking.reconcile(self.collector.as_ref()).await;
        self.report()
    }

    pub async fn command(&mut self, action: TrackingAction) -> StatusReport {
        info!("tracking {} requested", action.as_str());
        self.tracking.command(self.collector.as_ref(), action).await;
        self.report()
    }

    pub async fn debug_windows(&self) -> Result<Vec<HostWindow>> {
        self.host.windows().await
    }

    fn gate_open(&self) -> bool {
        if self.tracking.can_emit() {
            return true;
        }
        debug!(
            "capture gated (state {}, reachable {})",
            self.tracking.state().as_str(),
            self.tracking.reachable()
        );
        false
    }

    async fn capture(
        &mut self,
        context: Context,
        trigger: Trigger,
        now: DateTime<Utc>,
    ) -> Option<ActivityEvent> {
        match self.debouncer.decide(&context, trigger, now) {
            Decision::Emit => {}
            Decision::InternalPage => {
                debug!("skipping internal page {}", context.url);
                return None;
            }
            Decision::Duplicate => {
                debug!("duplicate {} for {}", trigger.event_type().as_str(), context.url);
                return None;
            }
        }

        let description = classify(&context.url, context.title.as_deref());
        let event = self.debouncer.record(&context, description, trigger, now);

        if let Err(err) = self.collector.ingest(&event).await {
            warn!("ingest failed, pausing capture until the collector is back: {err}");
            self.tracking.mark_unreachable();
            return None;
        }

        info!("{} - {}", event.event_type.as_str(), event.description);
        Some(event)
    }
}
