//! Destination trait - FanOutDispatcher output interface
//!
//! Defines the capability contract every delivery target implements.

use async_trait::async_trait;

use crate::{DeliveryError, TrackedEvent};

/// Delivery target for tracked events.
///
/// Implementations translate a generic event into their vendor wire format
/// and perform the I/O. The pipeline treats them as opaque beyond this
/// contract. A destination may be invoked from several in-flight dispatch
/// calls at once; internal serialization, where needed, is the
/// destination's own responsibility.
///
/// `async_trait` is used (rather than native async fns) so destinations
/// stay dyn-compatible behind `Arc<dyn Destination>`.
#[async_trait]
pub trait Destination: Send + Sync {
    /// Stable identifier used in error messages and metrics labels.
    fn name(&self) -> &str;

    /// Whether this destination has a real batch path. Queried at dispatch
    /// time; when `false` the dispatcher falls back to sequential sends.
    fn supports_batch(&self) -> bool {
        false
    }

    /// Invoked once at pipeline construction. A failure is reported but
    /// does not prevent the pipeline from becoming operational.
    async fn init(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Deliver a single event.
    async fn send(&self, event: &TrackedEvent) -> Result<(), DeliveryError>;

    /// Deliver a batch of events in order. Only called when
    /// `supports_batch()` returns true; the default delegates to
    /// sequential sends so batch-capable implementations can share code
    /// paths in tests.
    async fn send_batch(&self, events: &[TrackedEvent]) -> Result<(), DeliveryError> {
        for event in events {
            self.send(event).await?;
        }
        Ok(())
    }

    /// Invoked once at pipeline teardown. Failures are reported and do not
    /// abort teardown of remaining destinations.
    async fn destroy(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}
