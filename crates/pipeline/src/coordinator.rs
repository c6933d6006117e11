//! Pipeline coordinator - wiring of gate, chain, queue and fan-out

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use batcher::{BatchQueue, ReleaseFn};
use consent::ConsentGate;
use contracts::{
    BatchSettings, ConsentRules, ConsentState, Destination, EventDef, Middleware, Payload,
    PipelineBlueprint, PipelineError, TrackedEvent,
};
use dispatcher::{create_destination, DispatcherError, FanOutDispatcher, MiddlewareChain};
use dispatcher::metrics::MetricsSnapshot;
use observability::{record_batch_released, record_consent_denied, record_event_emitted};
use tracing::{error, info, instrument};

use crate::catalog::EventCatalog;

/// Callback invoked for every recoverable failure. Direct-dispatch
/// delivery failures carry the triggering event for context.
pub type ErrorCallback = Arc<dyn Fn(&PipelineError, Option<&TrackedEvent>) + Send + Sync>;

/// Default error callback: log to the diagnostic stream with enough
/// context to locate the failure.
pub fn default_error_callback() -> ErrorCallback {
    Arc::new(|err, event| match event {
        Some(event) => error!(error = %err, event = %event.key, "pipeline error"),
        None => error!(error = %err, "pipeline error"),
    })
}

/// Builder for creating a Pipeline
pub struct PipelineBuilder {
    destinations: Vec<Arc<dyn Destination>>,
    middleware: Vec<Arc<dyn Middleware>>,
    consent_state: ConsentState,
    consent_rules: ConsentRules,
    queue: BatchSettings,
    global_metadata: Payload,
    on_error: Option<ErrorCallback>,
    catalog: EventCatalog,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            destinations: Vec::new(),
            middleware: Vec::new(),
            consent_state: ConsentState::default(),
            consent_rules: ConsentRules::default(),
            queue: BatchSettings::default(),
            global_metadata: Payload::new(),
            on_error: None,
            catalog: EventCatalog::default(),
        }
    }

    /// Build a pipeline from a loaded blueprint, creating the configured
    /// destinations through the factory.
    pub fn from_blueprint(blueprint: &PipelineBlueprint) -> Result<Self, DispatcherError> {
        let mut builder = Self::new();

        for config in &blueprint.destinations {
            builder.destinations.push(create_destination(config)?);
        }

        builder.consent_state =
            ConsentState::from_grants(blueprint.consent.default_state.clone());
        builder.consent_rules = ConsentRules {
            mapping: blueprint.consent.mapping.clone(),
            default_category: blueprint.consent.default_category.clone(),
        };
        builder.queue = blueprint.queue.clone();
        builder.global_metadata = blueprint.global_metadata.clone();
        builder.catalog = EventCatalog::from_defs(blueprint.events.clone());

        Ok(builder)
    }

    pub fn destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destinations.push(destination);
        self
    }

    pub fn middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn consent(mut self, state: ConsentState, rules: ConsentRules) -> Self {
        self.consent_state = state;
        self.consent_rules = rules;
        self
    }

    pub fn queue(mut self, settings: BatchSettings) -> Self {
        self.queue = settings;
        self
    }

    pub fn global_metadata(mut self, metadata: Payload) -> Self {
        self.global_metadata = metadata;
        self
    }

    pub fn on_error(mut self, callback: ErrorCallback) -> Self {
        self.on_error = Some(callback);
        self
    }

    pub fn catalog(mut self, defs: Vec<EventDef>) -> Self {
        self.catalog = EventCatalog::from_defs(defs);
        self
    }

    /// Build and initialize the pipeline.
    ///
    /// Destination init failures are reported through the error callback
    /// but do not prevent the pipeline from becoming operational.
    #[instrument(name = "pipeline_build", skip(self), fields(destinations = self.destinations.len()))]
    pub async fn build(self) -> Pipeline {
        let on_error = self.on_error.unwrap_or_else(default_error_callback);
        let gate = ConsentGate::new(self.consent_state, self.consent_rules);
        let chain = MiddlewareChain::new(self.middleware);
        let fanout = Arc::new(FanOutDispatcher::new(self.destinations, chain));

        for err in fanout.init_all().await {
            (on_error)(&err.into(), None);
        }

        let queue = if self.queue.enabled {
            let release_fanout = Arc::clone(&fanout);
            let release_on_error = Arc::clone(&on_error);
            let release: ReleaseFn = Arc::new(move |batch| {
                let fanout = Arc::clone(&release_fanout);
                let on_error = Arc::clone(&release_on_error);
                Box::pin(async move {
                    record_batch_released(batch.len());
                    for err in fanout.dispatch_batch(batch).await {
                        (on_error)(&err, None);
                    }
                })
            });
            Some(BatchQueue::new(self.queue, release))
        } else {
            None
        };

        info!(
            destinations = fanout.destination_count(),
            batching = queue.is_some(),
            "pipeline ready"
        );

        Pipeline {
            gate,
            fanout,
            queue,
            global_metadata: RwLock::new(self.global_metadata),
            on_error,
            catalog: self.catalog,
        }
    }
}

/// The pipeline coordinator.
///
/// Best-effort, in-memory dispatch: no durable delivery across restarts,
/// no retries, no exactly-once semantics. `emit` never surfaces an error
/// to the caller; every recoverable failure goes to the error callback.
pub struct Pipeline {
    gate: ConsentGate,
    fanout: Arc<FanOutDispatcher>,
    queue: Option<BatchQueue>,
    global_metadata: RwLock<Payload>,
    on_error: ErrorCallback,
    catalog: EventCatalog,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Emit one event into the pipeline.
    #[instrument(name = "pipeline_emit", skip(self, payload))]
    pub async fn emit(&self, area: &str, name: &str, payload: Payload) {
        if !self.catalog.is_empty() && !self.catalog.contains(area, name) {
            (self.on_error)(&PipelineError::unknown_event(area, name), None);
            return;
        }

        let metadata = self
            .global_metadata
            .read()
            .map(|m| m.clone())
            .unwrap_or_default();
        let event = TrackedEvent::with_metadata(area, name, payload, metadata);
        record_event_emitted(&event.area);

        if !self.gate.is_allowed(&event) {
            // Expected, silent outcome; never reaches the error callback
            record_consent_denied(self.gate.resolve_category(&event));
            return;
        }

        match &self.queue {
            Some(queue) => {
                if let Err(err) = queue.push(event).await {
                    (self.on_error)(&err, None);
                }
            }
            None => {
                let context = event.clone();
                match self.fanout.dispatch(event).await {
                    Ok(failures) => {
                        for failure in failures {
                            (self.on_error)(&failure.into(), Some(&context));
                        }
                    }
                    Err(err) => (self.on_error)(&err, Some(&context)),
                }
            }
        }
    }

    /// Emit with a fallible payload builder. A builder error is caught
    /// here and reported, never propagated to the caller.
    pub async fn emit_with<F>(&self, area: &str, name: &str, build: F)
    where
        F: FnOnce() -> Result<Payload, PipelineError>,
    {
        match build() {
            Ok(payload) => self.emit(area, name, payload).await,
            Err(err) => (self.on_error)(&err, None),
        }
    }

    /// Merge a partial consent update.
    pub fn set_consent(&self, partial: HashMap<String, bool>) {
        self.gate.update(partial);
    }

    /// Defensive copy of the current consent state.
    pub fn consent(&self) -> ConsentState {
        self.gate.state()
    }

    /// Replace the metadata merged into every subsequent event.
    pub fn set_global_metadata(&self, metadata: Payload) {
        if let Ok(mut guard) = self.global_metadata.write() {
            *guard = metadata;
        }
    }

    /// Release anything currently buffered. No-op without batching.
    pub async fn flush(&self) {
        if let Some(queue) = &self.queue {
            queue.flush().await;
        }
    }

    /// Tear the pipeline down: stop the batch timer, drain the queue,
    /// then destroy every destination (failures reported, teardown of the
    /// remaining destinations never aborted).
    #[instrument(name = "pipeline_destroy", skip(self))]
    pub async fn destroy(&self) {
        if let Some(queue) = &self.queue {
            queue.destroy().await;
        }
        for err in self.fanout.destroy_all().await {
            (self.on_error)(&err.into(), None);
        }
        info!("pipeline destroyed");
    }

    /// Per-destination delivery metrics snapshots.
    pub fn delivery_metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.fanout.metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Next;
    use dispatcher::MemoryDestination;
    use serde_json::json;
    use std::sync::Mutex;

    fn capturing_callback() -> (ErrorCallback, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let callback: ErrorCallback = Arc::new(move |err, event| {
            let context = event.map(|e| e.key.to_string()).unwrap_or_default();
            seen_clone
                .lock()
                .unwrap()
                .push(format!("{err}|{context}"));
        });
        (callback, seen)
    }

    fn granted_analytics() -> ConsentState {
        ConsentState::from_grants(HashMap::from([("analytics".to_string(), true)]))
    }

    #[tokio::test]
    async fn test_emit_direct_dispatch() {
        let mem = Arc::new(MemoryDestination::new("mem"));
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .build()
            .await;

        pipeline.emit("nav", "click", Payload::new()).await;
        assert_eq!(mem.recorded_keys(), vec!["nav::click"]);
        assert_eq!(mem.init_count(), 1);
    }

    #[tokio::test]
    async fn test_consent_denied_is_silent_and_total() {
        let mem = Arc::new(MemoryDestination::new("mem"));
        let (callback, seen) = capturing_callback();
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .on_error(callback)
            .build()
            .await;

        // Nothing granted analytics
        pipeline.emit("nav", "click", Payload::new()).await;
        assert!(mem.recorded().is_empty());
        assert!(seen.lock().unwrap().is_empty());

        pipeline
            .set_consent(HashMap::from([("analytics".to_string(), true)]));
        pipeline.emit("nav", "click", Payload::new()).await;
        assert_eq!(mem.recorded().len(), 1);
    }

    #[tokio::test]
    async fn test_global_metadata_merged_into_events() {
        let mem = Arc::new(MemoryDestination::new("mem"));
        let mut metadata = Payload::new();
        metadata.insert("app".to_string(), json!("demo"));

        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .global_metadata(metadata)
            .build()
            .await;

        pipeline.emit("nav", "click", Payload::new()).await;
        assert_eq!(mem.recorded()[0].metadata["app"], json!("demo"));
    }

    #[tokio::test]
    async fn test_unknown_event_reported_not_delivered() {
        let mem = Arc::new(MemoryDestination::new("mem"));
        let (callback, seen) = capturing_callback();
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .catalog(vec![EventDef {
                area: "nav".to_string(),
                name: "click".to_string(),
            }])
            .on_error(callback)
            .build()
            .await;

        pipeline.emit("nav", "click", Payload::new()).await;
        pipeline.emit("nav", "undeclared", Payload::new()).await;

        assert_eq!(mem.recorded_keys(), vec!["nav::click"]);
        let errors = seen.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("nav::undeclared"));
    }

    #[tokio::test]
    async fn test_delivery_failure_reported_with_event_context() {
        let bad = Arc::new(MemoryDestination::new("bad"));
        bad.fail_sends(true);
        let (callback, seen) = capturing_callback();
        let pipeline = Pipeline::builder()
            .destination(bad)
            .consent(granted_analytics(), ConsentRules::default())
            .on_error(callback)
            .build()
            .await;

        pipeline.emit("nav", "click", Payload::new()).await;

        let errors = seen.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("bad"));
        // Direct-dispatch failures carry the triggering event
        assert!(errors[0].ends_with("nav::click"));
    }

    #[tokio::test]
    async fn test_queued_emit_batches_until_threshold() {
        let mem = Arc::new(MemoryDestination::new("mem").with_batch_support());
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .queue(BatchSettings {
                enabled: true,
                max_size: 2,
                flush_interval_ms: 0,
            })
            .build()
            .await;

        pipeline.emit("nav", "a", Payload::new()).await;
        assert!(mem.recorded().is_empty());

        pipeline.emit("nav", "b", Payload::new()).await;
        assert_eq!(mem.batch_sizes(), vec![2]);
        assert_eq!(mem.recorded_keys(), vec!["nav::a", "nav::b"]);
    }

    #[tokio::test]
    async fn test_destroy_drains_queue_and_destroys_destinations() {
        let mem = Arc::new(MemoryDestination::new("mem").with_batch_support());
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .queue(BatchSettings {
                enabled: true,
                max_size: 100,
                flush_interval_ms: 0,
            })
            .build()
            .await;

        pipeline.emit("nav", "pending", Payload::new()).await;
        assert!(mem.recorded().is_empty());

        pipeline.destroy().await;
        assert_eq!(mem.recorded_keys(), vec!["nav::pending"]);
        assert_eq!(mem.destroy_count(), 1);
    }

    #[tokio::test]
    async fn test_emit_with_builder_error_is_reported() {
        let mem = Arc::new(MemoryDestination::new("mem"));
        let (callback, seen) = capturing_callback();
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .on_error(callback)
            .build()
            .await;

        pipeline
            .emit_with("nav", "click", || {
                Err(PipelineError::Other("malformed payload".to_string()))
            })
            .await;

        assert!(mem.recorded().is_empty());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_middleware_applies_on_direct_path() {
        let mem = Arc::new(MemoryDestination::new("mem"));
        let pipeline = Pipeline::builder()
            .destination(mem.clone())
            .consent(granted_analytics(), ConsentRules::default())
            .middleware(Arc::new(|mut e: TrackedEvent, next: &Next| {
                e.metadata.insert("enriched".to_string(), json!(true));
                next.proceed(e);
            }))
            .build()
            .await;

        pipeline.emit("nav", "click", Payload::new()).await;
        assert_eq!(mem.recorded()[0].metadata["enriched"], json!(true));
    }
}
