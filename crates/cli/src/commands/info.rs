//! `info` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    consent: ConsentInfo,
    queue: QueueInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    destinations: Vec<DestinationInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<String>,
}

#[derive(Serialize)]
struct ConsentInfo {
    default_category: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    default_state: std::collections::HashMap<String, bool>,
    mapped_patterns: usize,
}

#[derive(Serialize)]
struct QueueInfo {
    enabled: bool,
    max_size: usize,
    flush_interval_ms: u64,
}

#[derive(Serialize)]
struct DestinationInfo {
    name: String,
    kind: String,
    #[serde(skip_serializing_if = "std::collections::HashMap::is_empty")]
    params: std::collections::HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) -> ConfigInfo {
    let destinations = if args.destinations {
        blueprint
            .destinations
            .iter()
            .map(|d| DestinationInfo {
                name: d.name.clone(),
                kind: format!("{:?}", d.kind),
                params: d.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let events = if args.events {
        blueprint
            .events
            .iter()
            .map(|e| format!("{}::{}", e.area, e.name))
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        consent: ConsentInfo {
            default_category: blueprint.consent.default_category.clone(),
            default_state: blueprint.consent.default_state.clone(),
            mapped_patterns: blueprint.consent.mapping.len(),
        },
        queue: QueueInfo {
            enabled: blueprint.queue.enabled,
            max_size: blueprint.queue.max_size,
            flush_interval_ms: blueprint.queue.flush_interval_ms,
        },
        destinations,
        events,
    }
}

fn print_config_info(blueprint: &contracts::PipelineBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Beacon Configuration                        ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    // Consent
    println!("🔒 Consent");
    println!("   ├─ Default category: {}", blueprint.consent.default_category);
    println!("   ├─ Mapped patterns: {}", blueprint.consent.mapping.len());
    if blueprint.consent.default_state.is_empty() {
        println!("   └─ Initial grants: (necessary only)");
    } else {
        println!("   └─ Initial grants: {:?}", blueprint.consent.default_state);
    }

    // Queue
    println!("\n⚙️  Queue");
    if blueprint.queue.enabled {
        println!("   ├─ Batching: enabled");
        println!("   ├─ Max size: {}", blueprint.queue.max_size);
        if blueprint.queue.flush_interval_ms == 0 {
            println!("   └─ Flush interval: disabled");
        } else {
            println!("   └─ Flush interval: {} ms", blueprint.queue.flush_interval_ms);
        }
    } else {
        println!("   └─ Batching: disabled (direct dispatch)");
    }

    // Destinations
    println!("\n📤 Destinations ({})", blueprint.destinations.len());
    for (i, destination) in blueprint.destinations.iter().enumerate() {
        let is_last = i == blueprint.destinations.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        if args.destinations && !destination.params.is_empty() {
            println!(
                "   {} {} ({:?}) {:?}",
                prefix, destination.name, destination.kind, destination.params
            );
        } else {
            println!("   {} {} ({:?})", prefix, destination.name, destination.kind);
        }
    }

    // Event catalog
    if args.events && !blueprint.events.is_empty() {
        println!("\n📇 Event Catalog ({})", blueprint.events.len());
        for (i, event) in blueprint.events.iter().enumerate() {
            let is_last = i == blueprint.events.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!("   {} {}::{}", prefix, event.area, event.name);
        }
    } else if !blueprint.events.is_empty() {
        println!("\n📇 Event Catalog: {} declared events", blueprint.events.len());
    }

    println!();
}
