//! Console Pipeline Demo
//!
//! Builds a pipeline programmatically with a log destination, grants the
//! analytics category, and emits a handful of events through a middleware
//! that stamps an application version onto every payload.
//!
//! Run with: cargo run --bin console_pipeline

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{ConsentRules, ConsentState, Next, Payload, TrackedEvent};
use dispatcher::LogDestination;
use pipeline::Pipeline;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Console Pipeline Demo");

    // ==== Stage 1: Build the pipeline ====
    let stamp_version = |mut event: TrackedEvent, next: &Next| {
        event
            .payload
            .insert("app_version".to_string(), json!("1.0.0"));
        next.proceed(event);
    };

    let consent = ConsentState::from_grants(HashMap::from([("analytics".to_string(), true)]));
    let rules = ConsentRules {
        mapping: HashMap::from([("ads".to_string(), "marketing".to_string())]),
        default_category: "analytics".to_string(),
    };

    let pipeline = Pipeline::builder()
        .destination(Arc::new(LogDestination::new("console")))
        .middleware(Arc::new(stamp_version))
        .consent(consent, rules)
        .build()
        .await;

    // ==== Stage 2: Emit events ====
    let mut payload = Payload::new();
    payload.insert("page".to_string(), json!("/pricing"));
    pipeline.emit("navigation", "page_view", payload).await;

    pipeline
        .emit_with("ui", "button_click", || {
            let mut payload = Payload::new();
            payload.insert("button".to_string(), json!("signup"));
            Ok(payload)
        })
        .await;

    // Silently filtered: the ads area maps to marketing, never granted
    pipeline.emit("ads", "impression", Payload::new()).await;

    // ==== Stage 3: Teardown ====
    pipeline.destroy().await;

    for (name, snapshot) in pipeline.delivery_metrics() {
        tracing::info!(
            destination = %name,
            sent = snapshot.sent_count,
            failures = snapshot.failure_count,
            "Delivery summary"
        );
    }

    tracing::info!("Console Pipeline Demo finished");
    Ok(())
}
