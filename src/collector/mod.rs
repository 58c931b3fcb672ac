//! The remote collector: receives activity events and tracking commands and
//! owns the authoritative tracking state.

mod error;
mod http;

pub use error::{CollectorError, CollectorResult};
pub use http::HttpCollector;

use async_trait::async_trait;

use crate::models::ActivityEvent;
use crate::tracking::{RemoteStatus, TrackingAction};

#[async_trait]
pub trait Collector: Send + Sync {
    /// Succeeds when the collector is up.
    async fn health(&self) -> CollectorResult<()>;

    /// The authoritative tracking snapshot.
    async fn status(&self) -> CollectorResult<RemoteStatus>;

    /// Asks the collector to change tracking state. A rejection means the
    /// transition was illegal from the collector's point of view.
    async fn command(&self, action: TrackingAction) -> CollectorResult<()>;

    async fn ingest(&self, event: &ActivityEvent) -> CollectorResult<()>;
}
