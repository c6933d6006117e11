//! Run orchestrator - wires the blueprint, pipeline, and input stream.
//!
//! Reads JSON-lines event records, emits them into the pipeline, then
//! flushes and tears the pipeline down before reporting statistics.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{Payload, PipelineBlueprint};
use pipeline::{ErrorCallback, Pipeline, PipelineBuilder};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{info, warn};

use super::RunStats;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// The pipeline blueprint
    pub blueprint: PipelineBlueprint,

    /// Input JSON-lines file (None = stdin)
    pub input: Option<PathBuf>,

    /// Maximum number of events to emit (None = unlimited)
    pub max_events: Option<u64>,

    /// Consent grants applied on top of the blueprint defaults
    pub consent_grants: Option<HashMap<String, bool>>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One event record from the input stream
#[derive(Debug, Deserialize)]
struct InputRecord {
    area: String,
    name: String,
    #[serde(default)]
    payload: Payload,
}

/// Main run orchestrator
pub struct Runner {
    config: RunnerConfig,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline over the input stream to completion
    pub async fn run(self) -> Result<RunStats> {
        let start_time = Instant::now();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Build the pipeline from the blueprint
        let error_count = Arc::new(AtomicU64::new(0));
        let callback = counting_error_callback(Arc::clone(&error_count));

        let pipeline = PipelineBuilder::from_blueprint(&self.config.blueprint)
            .context("Failed to build pipeline from blueprint")?
            .on_error(callback)
            .build()
            .await;

        if let Some(ref grants) = self.config.consent_grants {
            pipeline.set_consent(grants.clone());
            info!(grants = ?grants, "Applied consent overrides from CLI");
        }

        let active_destinations = self.config.blueprint.destinations.len();
        if active_destinations == 0 {
            warn!("No destinations configured - events will be dropped");
        }

        info!(
            destinations = active_destinations,
            batching = self.config.blueprint.queue.enabled,
            max_events = ?self.config.max_events,
            "Pipeline running"
        );

        // Feed the input stream
        let mut stats = self.feed_events(&pipeline).await?;

        // Shutdown: drain the queue, destroy destinations
        info!("Shutting down pipeline...");
        pipeline.destroy().await;

        stats.duration = start_time.elapsed();
        stats.active_destinations = active_destinations;
        stats.pipeline_errors = error_count.load(Ordering::Relaxed);
        stats.deliveries = pipeline.delivery_metrics();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            eps = format!("{:.2}", stats.eps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }

    /// Read JSON-lines records and emit them into the pipeline
    async fn feed_events(&self, pipeline: &Pipeline) -> Result<RunStats> {
        let reader: Box<dyn AsyncRead + Unpin + Send> = match &self.config.input {
            Some(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open input file {}", path.display()))?;
                Box::new(file)
            }
            None => Box::new(tokio::io::stdin()),
        };

        let mut lines = BufReader::new(reader).lines();
        let mut stats = RunStats::default();
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            stats.records_read += 1;

            let record: InputRecord = match serde_json::from_str(trimmed) {
                Ok(record) => record,
                Err(e) => {
                    warn!(line = line_number, error = %e, "Skipping invalid event record");
                    stats.invalid_records += 1;
                    continue;
                }
            };

            pipeline
                .emit(&record.area, &record.name, record.payload)
                .await;
            stats.events_emitted += 1;

            if let Some(max) = self.config.max_events {
                if stats.events_emitted >= max {
                    info!(events = stats.events_emitted, "Reached max events limit");
                    break;
                }
            }
        }

        Ok(stats)
    }
}

/// Error callback that logs and counts every reported failure
fn counting_error_callback(count: Arc<AtomicU64>) -> ErrorCallback {
    Arc::new(move |err, event| {
        count.fetch_add(1, Ordering::Relaxed);
        match event {
            Some(event) => {
                tracing::error!(error = %err, event = %event.key, "Pipeline error")
            }
            None => tracing::error!(error = %err, "Pipeline error"),
        }
    })
}
