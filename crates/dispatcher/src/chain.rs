//! MiddlewareChain - ordered transform/filter steps for one event

use std::sync::Arc;

use contracts::{Middleware, Next, PipelineError, TrackedEvent};
use tracing::debug;

/// Sequential middleware chain.
///
/// Each middleware is invoked exactly once per event, in registration
/// order, each given the event produced by its predecessor. A middleware
/// that never calls its continuation drops the event; one that calls it
/// more than once fails the event with `ChainMisuse`. An empty chain is
/// the identity transform.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    steps: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new(steps: Vec<Arc<dyn Middleware>>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the event through every step.
    ///
    /// Returns `Ok(Some(event))` with the final transformed event,
    /// `Ok(None)` when a step intentionally dropped it, or
    /// `Err(ChainMisuse)` when a step invoked its continuation twice.
    pub fn apply(&self, event: TrackedEvent) -> Result<Option<TrackedEvent>, PipelineError> {
        let mut current = event;

        for (index, step) in self.steps.iter().enumerate() {
            let key = current.key.clone();
            let next = Next::new();
            step.handle(current, &next);

            if next.call_count() > 1 {
                return Err(PipelineError::chain_misuse(key.as_str()));
            }

            match next.into_forwarded() {
                Some(forwarded) => current = forwarded,
                None => {
                    debug!(event = %key, step = index, "middleware dropped event");
                    metrics::counter!("beacon_middleware_dropped_total").increment(1);
                    return Ok(None);
                }
            }
        }

        Ok(Some(current))
    }
}
