//! HttpDestination - JSON POST to a collector endpoint

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use contracts::{DeliveryError, Destination, TrackedEvent};
use tracing::debug;

const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Configuration for HttpDestination
#[derive(Debug, Clone)]
pub struct HttpDestinationConfig {
    /// Collector endpoint URL
    pub endpoint: String,
    /// Request timeout
    pub timeout: Duration,
}

impl HttpDestinationConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, String> {
        let endpoint = params
            .get("endpoint")
            .cloned()
            .ok_or_else(|| "missing 'endpoint' parameter".to_string())?;

        let timeout_ms = params
            .get("timeout_ms")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        Ok(Self {
            endpoint,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

/// Destination that POSTs events to an HTTP collector.
///
/// A single event is posted as a JSON object, a batch as a JSON array.
/// Connect-level failures surface as `CollectorUnavailable`; anything the
/// collector answered with a non-success status becomes `Transport`.
pub struct HttpDestination {
    name: String,
    config: HttpDestinationConfig,
    client: reqwest::Client,
}

impl HttpDestination {
    /// Create a new HttpDestination
    pub fn new(name: impl Into<String>, config: HttpDestinationConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| format!("failed to build http client: {e}"))?;

        Ok(Self {
            name: name.into(),
            config,
            client,
        })
    }

    /// Create from params (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, String> {
        let config = HttpDestinationConfig::from_params(params)?;
        Self::new(name, config)
    }

    fn map_error(&self, error: reqwest::Error) -> DeliveryError {
        if error.is_connect() || error.is_timeout() {
            DeliveryError::collector_unavailable(format!(
                "{}: {error}",
                self.config.endpoint
            ))
        } else {
            DeliveryError::transport(error.to_string())
        }
    }

    async fn post_json<T: serde::Serialize + ?Sized>(&self, body: &T) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::transport(format!(
                "collector answered {status}"
            )));
        }

        debug!(destination = %self.name, status = %status, "delivered");
        Ok(())
    }
}

#[async_trait]
impl Destination for HttpDestination {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn send(&self, event: &TrackedEvent) -> Result<(), DeliveryError> {
        self.post_json(event).await
    }

    async fn send_batch(&self, events: &[TrackedEvent]) -> Result<(), DeliveryError> {
        self.post_json(events).await
    }
}
