use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder, Response};

use crate::config::CaptureConfig;
use crate::models::ActivityEvent;
use crate::tracking::{RemoteStatus, TrackingAction};

use super::{Collector, CollectorError, CollectorResult};

/// JSON-over-HTTP client for a collector listening on `api_base`.
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: Client,
    config: CaptureConfig,
}

impl HttpCollector {
    pub fn new(config: CaptureConfig) -> CollectorResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { client, config })
    }

    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
        timeout: Option<Duration>,
    ) -> CollectorResult<Response> {
        let request = match timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        debug!("{endpoint} -> {status}");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CollectorError::Rejected {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn health(&self) -> CollectorResult<()> {
        let request = self.client.get(self.config.health_url());
        self.send("/health", request, Some(self.config.health_timeout()))
            .await
            .map(|_| ())
    }

    async fn status(&self) -> CollectorResult<RemoteStatus> {
        let request = self.client.get(self.config.api_url("/tracking/status"));
        let response = self
            .send("/tracking/status", request, Some(self.config.health_timeout()))
            .await?;
        Ok(response.json::<RemoteStatus>().await?)
    }

    async fn command(&self, action: TrackingAction) -> CollectorResult<()> {
        let endpoint = format!("/tracking/{}", action.as_str());
        let request = self.client.post(self.config.api_url(&endpoint));
        self.send(&endpoint, request, None).await.map(|_| ())
    }

    async fn ingest(&self, event: &ActivityEvent) -> CollectorResult<()> {
        let request = self
            .client
            .post(self.config.api_url("/events/ingest"))
            .json(event);
        self.send("/events/ingest", request, None).await.map(|_| ())
    }
}
