//! LogDestination - logs event summaries via tracing

use async_trait::async_trait;
use contracts::{DeliveryError, Destination, TrackedEvent};
use tracing::info;

/// Destination that logs event summaries for debugging
pub struct LogDestination {
    name: String,
}

impl LogDestination {
    /// Create a new LogDestination with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_event_summary(&self, event: &TrackedEvent) {
        info!(
            destination = %self.name,
            event = %event.key,
            timestamp_ms = event.timestamp_ms,
            payload_fields = event.payload.len(),
            metadata_fields = event.metadata.len(),
            "event received"
        );
    }
}

#[async_trait]
impl Destination for LogDestination {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn send(&self, event: &TrackedEvent) -> Result<(), DeliveryError> {
        self.log_event_summary(event);
        Ok(())
    }

    async fn send_batch(&self, events: &[TrackedEvent]) -> Result<(), DeliveryError> {
        info!(destination = %self.name, len = events.len(), "batch received");
        for event in events {
            self.log_event_summary(event);
        }
        Ok(())
    }

    async fn destroy(&self) -> Result<(), DeliveryError> {
        info!(destination = %self.name, "LogDestination closed");
        Ok(())
    }
}
