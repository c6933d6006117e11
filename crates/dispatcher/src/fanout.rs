//! FanOutDispatcher - multi-destination delivery with failure isolation

use std::sync::Arc;

use metrics::counter;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};

use contracts::{
    DeliveryError, Destination, DestinationAction, DestinationError, PipelineError, TrackedEvent,
};

use crate::chain::MiddlewareChain;
use crate::metrics::{DeliveryMetrics, MetricsSnapshot};

struct DestinationSlot {
    destination: Arc<dyn Destination>,
    metrics: Arc<DeliveryMetrics>,
}

/// Dispatcher that delivers events or batches to every registered
/// destination.
///
/// Destinations are fully isolated from one another: each runs as its own
/// tokio task, every failure is caught and re-signaled as a
/// `DestinationError`, and a dispatch call resolves only after all
/// destinations have completed. The destination list is shared read-only
/// across all in-flight dispatch calls.
pub struct FanOutDispatcher {
    slots: Vec<DestinationSlot>,
    chain: MiddlewareChain,
}

impl FanOutDispatcher {
    pub fn new(destinations: Vec<Arc<dyn Destination>>, chain: MiddlewareChain) -> Self {
        let slots = destinations
            .into_iter()
            .map(|destination| DestinationSlot {
                destination,
                metrics: Arc::new(DeliveryMetrics::new()),
            })
            .collect();

        Self { slots, chain }
    }

    /// Number of registered destinations.
    pub fn destination_count(&self) -> usize {
        self.slots.len()
    }

    /// Get metrics for all destinations
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.slots
            .iter()
            .map(|slot| {
                (
                    slot.destination.name().to_string(),
                    slot.metrics.snapshot(),
                )
            })
            .collect()
    }

    /// Deliver a single event to every destination concurrently.
    ///
    /// The event passes through the middleware chain first; a dropped
    /// event resolves successfully without contacting any destination.
    /// Returns the aggregated failures; `Err` only for a chain misuse.
    #[instrument(name = "fanout_dispatch", skip(self, event), fields(event = %event.key))]
    pub async fn dispatch(
        &self,
        event: TrackedEvent,
    ) -> Result<Vec<DestinationError>, PipelineError> {
        let Some(event) = self.chain.apply(event)? else {
            return Ok(Vec::new());
        };

        let mut tasks: Vec<(String, JoinHandle<Result<(), DeliveryError>>)> =
            Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let destination = Arc::clone(&slot.destination);
            let metrics = Arc::clone(&slot.metrics);
            let event = event.clone();
            let name = destination.name().to_string();
            let label = name.clone();

            tasks.push((
                name,
                tokio::spawn(async move {
                    match destination.send(&event).await {
                        Ok(()) => {
                            metrics.inc_sent_count();
                            counter!(
                                "beacon_deliveries_total",
                                "destination" => label,
                                "status" => "success"
                            )
                            .increment(1);
                            Ok(())
                        }
                        Err(cause) => {
                            metrics.inc_failure_count();
                            counter!(
                                "beacon_deliveries_total",
                                "destination" => label,
                                "status" => "failure"
                            )
                            .increment(1);
                            Err(cause)
                        }
                    }
                }),
            ));
        }

        Ok(Self::collect(tasks, DestinationAction::Send).await)
    }

    /// Deliver a batch to every destination.
    ///
    /// Each event passes through the middleware chain independently;
    /// survivors keep their relative order. Per destination, the batch
    /// path is preferred when advertised at dispatch time, otherwise each
    /// survivor is sent sequentially in order. Chain misuse for one event
    /// is recorded and does not affect its siblings.
    #[instrument(name = "fanout_dispatch_batch", skip(self, events), fields(len = events.len()))]
    pub async fn dispatch_batch(&self, events: Vec<TrackedEvent>) -> Vec<PipelineError> {
        let mut errors: Vec<PipelineError> = Vec::new();
        let mut survivors = Vec::with_capacity(events.len());

        for event in events {
            match self.chain.apply(event) {
                Ok(Some(event)) => survivors.push(event),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        if survivors.is_empty() {
            debug!("no events survived middleware, nothing to deliver");
            return errors;
        }

        let survivors = Arc::new(survivors);
        let mut tasks: Vec<(String, JoinHandle<Vec<DestinationError>>)> =
            Vec::with_capacity(self.slots.len());

        for slot in &self.slots {
            let destination = Arc::clone(&slot.destination);
            let metrics = Arc::clone(&slot.metrics);
            let survivors = Arc::clone(&survivors);
            let name = destination.name().to_string();

            tasks.push((
                name.clone(),
                tokio::spawn(async move {
                    deliver_batch_to(destination, metrics, &survivors, name).await
                }),
            ));
        }

        for (name, task) in tasks {
            match task.await {
                Ok(destination_errors) => {
                    errors.extend(destination_errors.into_iter().map(PipelineError::from));
                }
                Err(e) => {
                    errors.push(
                        DestinationError::new(
                            name,
                            DestinationAction::SendBatch,
                            DeliveryError::Other(format!("delivery task panicked: {e}")),
                        )
                        .into(),
                    );
                }
            }
        }

        errors
    }

    /// Initialize every destination, isolating failures.
    pub async fn init_all(&self) -> Vec<DestinationError> {
        self.lifecycle_all(DestinationAction::Init).await
    }

    /// Tear down every destination, isolating failures.
    pub async fn destroy_all(&self) -> Vec<DestinationError> {
        self.lifecycle_all(DestinationAction::Destroy).await
    }

    async fn lifecycle_all(&self, action: DestinationAction) -> Vec<DestinationError> {
        let mut errors = Vec::new();
        for slot in &self.slots {
            let result = match action {
                DestinationAction::Init => slot.destination.init().await,
                DestinationAction::Destroy => slot.destination.destroy().await,
                _ => unreachable!("lifecycle_all only handles init/destroy"),
            };
            if let Err(cause) = result {
                slot.metrics.inc_failure_count();
                errors.push(DestinationError::new(
                    slot.destination.name(),
                    action,
                    cause,
                ));
            }
        }
        errors
    }

    async fn collect(
        tasks: Vec<(String, JoinHandle<Result<(), DeliveryError>>)>,
        action: DestinationAction,
    ) -> Vec<DestinationError> {
        let mut errors = Vec::new();
        for (name, task) in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(cause)) => errors.push(DestinationError::new(name, action, cause)),
                Err(e) => errors.push(DestinationError::new(
                    name,
                    action,
                    DeliveryError::Other(format!("delivery task panicked: {e}")),
                )),
            }
        }
        errors
    }
}

async fn deliver_batch_to(
    destination: Arc<dyn Destination>,
    metrics: Arc<DeliveryMetrics>,
    survivors: &[TrackedEvent],
    name: String,
) -> Vec<DestinationError> {
    // Capability is queried at dispatch time, not cached at registration
    if destination.supports_batch() {
        match destination.send_batch(survivors).await {
            Ok(()) => {
                metrics.inc_batch_count();
                counter!(
                    "beacon_batches_total",
                    "destination" => name,
                    "status" => "success"
                )
                .increment(1);
                Vec::new()
            }
            Err(cause) => {
                metrics.inc_failure_count();
                counter!(
                    "beacon_batches_total",
                    "destination" => name.clone(),
                    "status" => "failure"
                )
                .increment(1);
                vec![DestinationError::new(
                    name,
                    DestinationAction::SendBatch,
                    cause,
                )]
            }
        }
    } else {
        // Sequential fallback, preserving order; every failure recorded
        let mut errors = Vec::new();
        for event in survivors {
            match destination.send(event).await {
                Ok(()) => metrics.inc_sent_count(),
                Err(cause) => {
                    metrics.inc_failure_count();
                    errors.push(DestinationError::new(
                        name.clone(),
                        DestinationAction::Send,
                        cause,
                    ));
                }
            }
        }
        errors
    }
}
