//! Batched Pipeline Demo
//!
//! Loads a blueprint from a config file (or falls back to an inline one),
//! enables batching, and shows size-triggered and teardown flushes.
//!
//! Run with: cargo run --bin batched_pipeline [config.toml]

use std::collections::HashMap;

use config_loader::ConfigLoader;
use contracts::{
    BatchSettings, ConsentSection, DestinationConfig, DestinationKind, Payload, PipelineBlueprint,
};
use pipeline::PipelineBuilder;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    tracing::info!("Starting Batched Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        create_demo_blueprint()
    };

    // ==== Stage 2: Build the pipeline ====
    let pipeline = PipelineBuilder::from_blueprint(&blueprint)?.build().await;

    // ==== Stage 3: Emit a burst of events ====
    // With max_size = 3 the first three release as one batch; the
    // remainder is drained on destroy.
    for i in 0..5u32 {
        let mut payload = Payload::new();
        payload.insert("sequence".to_string(), json!(i));
        pipeline.emit("demo", "tick", payload).await;
    }

    // ==== Stage 4: Teardown drains the partial batch ====
    pipeline.destroy().await;

    for (name, snapshot) in pipeline.delivery_metrics() {
        tracing::info!(
            destination = %name,
            sent = snapshot.sent_count,
            batches = snapshot.batch_count,
            "Delivery summary"
        );
    }

    tracing::info!("Batched Pipeline Demo finished");
    Ok(())
}

/// Inline blueprint used when no config path is given
fn create_demo_blueprint() -> PipelineBlueprint {
    PipelineBlueprint {
        version: Default::default(),
        consent: ConsentSection {
            default_state: HashMap::from([("analytics".to_string(), true)]),
            mapping: HashMap::new(),
            default_category: "analytics".to_string(),
        },
        queue: BatchSettings {
            enabled: true,
            max_size: 3,
            flush_interval_ms: 0,
        },
        destinations: vec![DestinationConfig {
            name: "console".to_string(),
            kind: DestinationKind::Log,
            params: HashMap::new(),
        }],
        events: Vec::new(),
        global_metadata: Payload::new(),
    }
}
