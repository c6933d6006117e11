//! # Integration Tests
//!
//! End-to-end tests across the workspace crates.
//!
//! Covers:
//! - Full emit path: consent gate -> middleware chain -> fan-out
//! - Batching through the coordinator, including teardown draining
//! - Failure isolation between destinations
//! - Blueprint loading into a running pipeline

#[cfg(test)]
mod contract_tests {
    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use contracts::{
        BatchSettings, ConsentRules, ConsentState, Next, Payload, PipelineError, TrackedEvent,
    };
    use dispatcher::MemoryDestination;
    use pipeline::{ErrorCallback, Pipeline};
    use serde_json::json;

    fn payload(entries: &[(&str, serde_json::Value)]) -> Payload {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn analytics_granted() -> ConsentState {
        ConsentState::from_grants(HashMap::from([("analytics".to_string(), true)]))
    }

    fn counting_callback() -> (ErrorCallback, Arc<AtomicU64>, Arc<Mutex<Vec<String>>>) {
        let count = Arc::new(AtomicU64::new(0));
        let messages = Arc::new(Mutex::new(Vec::new()));
        let count_clone = Arc::clone(&count);
        let messages_clone = Arc::clone(&messages);
        let callback: ErrorCallback = Arc::new(move |err, _event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
            messages_clone.lock().unwrap().push(err.to_string());
        });
        (callback, count, messages)
    }

    /// End-to-end: consent gate filters per resolved category before
    /// anything reaches the destinations.
    #[tokio::test]
    async fn test_e2e_consent_filtering() {
        let allowed = Arc::new(MemoryDestination::new("allowed"));
        let rules = ConsentRules {
            mapping: HashMap::from([("checkout".to_string(), "marketing".to_string())]),
            default_category: "analytics".to_string(),
        };

        let pipeline = Pipeline::builder()
            .destination(allowed.clone())
            .consent(analytics_granted(), rules)
            .build()
            .await;

        // Default category (analytics) is granted, checkout maps to
        // marketing which was never granted.
        pipeline
            .emit("ui", "click", payload(&[("button", json!("buy"))]))
            .await;
        pipeline
            .emit("checkout", "purchase", payload(&[("total", json!(42))]))
            .await;

        let keys = allowed.recorded_keys();
        assert_eq!(keys, vec!["ui::click".to_string()]);

        pipeline.destroy().await;
    }

    /// Consent updates at runtime open previously denied categories.
    #[tokio::test]
    async fn test_e2e_consent_update_mid_stream() {
        let memory = Arc::new(MemoryDestination::new("memory"));
        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .consent(ConsentState::default(), ConsentRules::default())
            .build()
            .await;

        pipeline.emit("ui", "early", Payload::new()).await;
        assert!(memory.recorded().is_empty());

        pipeline.set_consent(HashMap::from([("analytics".to_string(), true)]));
        pipeline.emit("ui", "late", Payload::new()).await;

        assert_eq!(memory.recorded_keys(), vec!["ui::late".to_string()]);
        pipeline.destroy().await;
    }

    /// Middleware enriches payloads and can drop events by not calling
    /// the continuation; dropped events never reach any destination.
    #[tokio::test]
    async fn test_e2e_middleware_enrich_and_drop() {
        let memory = Arc::new(MemoryDestination::new("memory"));

        let enrich = |mut event: TrackedEvent, next: &Next| {
            event
                .payload
                .insert("app_version".to_string(), json!("2.1.0"));
            next.proceed(event);
        };
        let filter = |event: TrackedEvent, next: &Next| {
            if event.name != "internal" {
                next.proceed(event);
            }
        };

        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .middleware(Arc::new(enrich))
            .middleware(Arc::new(filter))
            .consent(analytics_granted(), ConsentRules::default())
            .build()
            .await;

        pipeline.emit("ui", "click", Payload::new()).await;
        pipeline.emit("ui", "internal", Payload::new()).await;

        let recorded = memory.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].payload.get("app_version"), Some(&json!("2.1.0")));

        pipeline.destroy().await;
    }

    /// A failing destination never blocks delivery to the others, and
    /// each failure is surfaced through the error callback.
    #[tokio::test]
    async fn test_e2e_failure_isolation() {
        let healthy = Arc::new(MemoryDestination::new("healthy"));
        let broken = Arc::new(MemoryDestination::new("broken"));
        broken.fail_sends(true);

        let (callback, errors, messages) = counting_callback();

        let pipeline = Pipeline::builder()
            .destination(healthy.clone())
            .destination(broken.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .on_error(callback)
            .build()
            .await;

        pipeline.emit("ui", "click", Payload::new()).await;
        pipeline.emit("ui", "scroll", Payload::new()).await;

        assert_eq!(healthy.recorded().len(), 2);
        assert!(broken.recorded().is_empty());
        assert_eq!(errors.load(Ordering::SeqCst), 2);
        assert!(messages.lock().unwrap()[0].contains("broken"));

        pipeline.destroy().await;
    }

    /// Batching: the queue releases when full, and destroy drains the
    /// remainder exactly once before tearing destinations down.
    #[tokio::test]
    async fn test_e2e_batching_size_and_teardown() {
        let memory = Arc::new(MemoryDestination::new("memory").with_batch_support());

        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .queue(BatchSettings {
                enabled: true,
                max_size: 2,
                flush_interval_ms: 0,
            })
            .build()
            .await;

        pipeline.emit("ui", "one", Payload::new()).await;
        pipeline.emit("ui", "two", Payload::new()).await;
        pipeline.emit("ui", "three", Payload::new()).await;

        // First batch released by the size trigger
        assert_eq!(memory.batch_sizes(), vec![2]);

        pipeline.destroy().await;

        assert_eq!(memory.batch_sizes(), vec![2, 1]);
        assert_eq!(
            memory.recorded_keys(),
            vec![
                "ui::one".to_string(),
                "ui::two".to_string(),
                "ui::three".to_string()
            ]
        );
        assert_eq!(memory.destroy_count(), 1);
    }

    /// An explicit flush releases a partial batch without waiting for the
    /// size trigger.
    #[tokio::test]
    async fn test_e2e_manual_flush() {
        let memory = Arc::new(MemoryDestination::new("memory").with_batch_support());

        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .queue(BatchSettings {
                enabled: true,
                max_size: 100,
                flush_interval_ms: 0,
            })
            .build()
            .await;

        pipeline.emit("ui", "click", Payload::new()).await;
        assert!(memory.batch_sizes().is_empty());

        pipeline.flush().await;
        assert_eq!(memory.batch_sizes(), vec![1]);

        pipeline.destroy().await;
    }

    /// Global metadata is attached to every event at emit time.
    #[tokio::test]
    async fn test_e2e_global_metadata() {
        let memory = Arc::new(MemoryDestination::new("memory"));

        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .global_metadata(payload(&[("session", json!("abc-123"))]))
            .build()
            .await;

        pipeline.emit("ui", "click", Payload::new()).await;

        let recorded = memory.recorded();
        assert_eq!(recorded[0].metadata.get("session"), Some(&json!("abc-123")));

        pipeline.destroy().await;
    }

    /// A declared catalog rejects unknown events through the error
    /// callback while declared ones flow normally.
    #[tokio::test]
    async fn test_e2e_catalog_gating() {
        let memory = Arc::new(MemoryDestination::new("memory"));
        let (callback, errors, _messages) = counting_callback();

        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .catalog(vec![contracts::EventDef {
                area: "ui".to_string(),
                name: "click".to_string(),
            }])
            .on_error(callback)
            .build()
            .await;

        pipeline.emit("ui", "click", Payload::new()).await;
        pipeline.emit("ui", "mystery", Payload::new()).await;

        assert_eq!(memory.recorded_keys(), vec!["ui::click".to_string()]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        pipeline.destroy().await;
    }

    /// The emit_with builder path reports builder failures instead of
    /// propagating them to the caller.
    #[tokio::test]
    async fn test_e2e_emit_with_builder_error() {
        let memory = Arc::new(MemoryDestination::new("memory"));
        let (callback, errors, _messages) = counting_callback();

        let pipeline = Pipeline::builder()
            .destination(memory.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .on_error(callback)
            .build()
            .await;

        pipeline
            .emit_with("ui", "click", || {
                Err(PipelineError::Other("payload serialization failed".to_string()))
            })
            .await;

        assert!(memory.recorded().is_empty());
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        pipeline.destroy().await;
    }

    /// A TOML blueprint builds a working pipeline end to end.
    #[tokio::test]
    async fn test_e2e_blueprint_to_pipeline() {
        let toml = r#"
            version = "v1"

            [consent]
            default_state = { analytics = true }
            default_category = "analytics"

            [queue]
            enabled = false

            [[destinations]]
            name = "console"
            kind = "log"

            [[events]]
            area = "ui"
            name = "click"
        "#;

        let blueprint =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .expect("blueprint should parse");

        let memory = Arc::new(MemoryDestination::new("memory"));
        let (callback, errors, _messages) = counting_callback();

        let pipeline = pipeline::PipelineBuilder::from_blueprint(&blueprint)
            .expect("destinations should build")
            .destination(memory.clone())
            .on_error(callback)
            .build()
            .await;

        pipeline.emit("ui", "click", Payload::new()).await;
        pipeline.emit("other", "unknown", Payload::new()).await;

        assert_eq!(memory.recorded_keys(), vec!["ui::click".to_string()]);
        assert_eq!(errors.load(Ordering::SeqCst), 1);

        pipeline.destroy().await;
    }

    /// Init failures on one destination do not keep the rest from
    /// becoming operational.
    #[tokio::test]
    async fn test_e2e_destination_lifecycle() {
        let first = Arc::new(MemoryDestination::new("first"));
        let second = Arc::new(MemoryDestination::new("second"));

        let pipeline = Pipeline::builder()
            .destination(first.clone())
            .destination(second.clone())
            .consent(analytics_granted(), ConsentRules::default())
            .build()
            .await;

        assert_eq!(first.init_count(), 1);
        assert_eq!(second.init_count(), 1);

        pipeline.destroy().await;

        assert_eq!(first.destroy_count(), 1);
        assert_eq!(second.destroy_count(), 1);
    }
}
