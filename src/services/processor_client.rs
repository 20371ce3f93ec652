use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::app::config::Config;
use crate::models::health::ServiceHealth;
use crate::models::payment::{PaymentEvent, SummaryResponse};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

/// Outbound capability the dispatch core depends on: one payment delivery,
/// one health probe. Implemented over HTTP in production and scripted in
/// tests.
#[async_trait]
pub trait ProcessorApi: Send + Sync {
    /// Posts the event to `{processor_url}/payments`. Any 2xx counts as a
    /// confirmed delivery; timeouts and transport errors count as failure
    /// and are absorbed by the caller's retry loop.
    async fn deliver(&self, processor_url: &str, event: &PaymentEvent) -> bool;

    /// Fetches `{health_url}/health`.
    async fn probe(&self) -> Result<ServiceHealth, ClientError>;
}

pub struct HttpProcessorClient {
    client: Client,
    health_url: String,
}

impl HttpProcessorClient {
    pub fn new(config: &Config) -> Self {
        // Timeout stays short so a slow processor fails fast and the
        // retry loop, not the caller, absorbs the error.
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_max_idle_per_host(config.semaphore_size)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        Self {
            client,
            health_url: config.health_url.clone(),
        }
    }
}

#[async_trait]
impl ProcessorApi for HttpProcessorClient {
    async fn deliver(&self, processor_url: &str, event: &PaymentEvent) -> bool {
        let result = self
            .client
            .post(format!("{processor_url}/payments"))
            .json(event)
            .send()
            .await;

        match result {
            Ok(response) => {
                let delivered = response.status().is_success();
                if !delivered {
                    debug!(
                        correlation_id = %event.correlation_id,
                        status = %response.status(),
                        "delivery rejected"
                    );
                }
                delivered
            }
            Err(err) => {
                debug!(correlation_id = %event.correlation_id, error = %err, "delivery failed");
                false
            }
        }
    }

    async fn probe(&self) -> Result<ServiceHealth, ClientError> {
        let response = self
            .client
            .get(format!("{}/health", self.health_url))
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(response.status()));
        }
        Ok(response.json::<ServiceHealth>().await?)
    }
}

/// Fetches the summary of a peer instance so a horizontally-scaled
/// deployment can answer with combined totals.
pub struct PeerClient {
    client: Client,
    base_url: String,
}

impl PeerClient {
    pub fn new(base_url: &str, config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("failed to build peer HTTP client");

        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Asks the peer for its local summary over the same raw range. The
    /// `single` marker stops the peer from fanning out in turn.
    pub async fn summary(
        &self,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<SummaryResponse, ClientError> {
        let mut request = self
            .client
            .get(format!("{}/payments-summary", self.base_url))
            .query(&[("single", "1")]);
        if let (Some(from), Some(to)) = (from, to) {
            request = request.query(&[("from", from), ("to", to)]);
        }

        let response = request.send().await?;
        if response.status() != StatusCode::OK {
            return Err(ClientError::UnexpectedStatus(response.status()));
        }
        Ok(response.json::<SummaryResponse>().await?)
    }
}
