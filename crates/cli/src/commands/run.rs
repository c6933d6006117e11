//! `run` command implementation.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::runner::{Runner, RunnerConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    info!(
        destinations = blueprint.destinations.len(),
        events = blueprint.events.len(),
        batching = blueprint.queue.enabled,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    // Build runner configuration
    let runner_config = RunnerConfig {
        blueprint,
        input: args.input.clone(),
        max_events: if args.max_events == 0 {
            None
        } else {
            Some(args.max_events)
        },
        consent_grants: args.consent.as_deref().map(parse_consent_grants),
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let runner = Runner::new(runner_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    // Run pipeline with shutdown signal
    tokio::select! {
        result = runner.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        events_emitted = stats.events_emitted,
                        invalid_records = stats.invalid_records,
                        duration_secs = stats.duration.as_secs_f64(),
                        eps = format!("{:.2}", stats.eps()),
                        "Pipeline completed successfully"
                    );

                    // Print detailed statistics
                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("Beacon finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Parse "analytics,marketing" or "analytics=true,marketing=false" grants
fn parse_consent_grants(raw: &str) -> HashMap<String, bool> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| match part.split_once('=') {
            Some((category, value)) => {
                (category.trim().to_string(), value.trim() == "true")
            }
            None => (part.trim().to_string(), true),
        })
        .collect()
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &contracts::PipelineBlueprint) {
    println!("\n=== Configuration Summary ===\n");

    println!("Destinations ({}):", blueprint.destinations.len());
    for destination in &blueprint.destinations {
        println!("  - {} ({:?})", destination.name, destination.kind);
    }

    println!("\nQueue:");
    if blueprint.queue.enabled {
        println!("  Batching: enabled");
        println!("  Max size: {}", blueprint.queue.max_size);
        println!("  Flush interval: {} ms", blueprint.queue.flush_interval_ms);
    } else {
        println!("  Batching: disabled (direct dispatch)");
    }

    println!("\nConsent:");
    println!("  Default category: {}", blueprint.consent.default_category);
    if !blueprint.consent.mapping.is_empty() {
        println!("  Mapped events: {}", blueprint.consent.mapping.len());
    }

    if !blueprint.events.is_empty() {
        println!("\nEvent catalog ({}):", blueprint.events.len());
        for event in &blueprint.events {
            println!("  - {}::{}", event.area, event.name);
        }
    }

    println!();
}
