//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Beacon - Multi-destination event dispatch pipeline
#[derive(Parser, Debug)]
#[command(
    name = "beacon",
    author,
    version,
    about = "Multi-destination analytics event pipeline",
    long_about = "An analytics event dispatch pipeline.\n\n\
                  Loads a pipeline blueprint from configuration, reads tracked events \n\
                  from a JSON-lines stream, filters them through consent and middleware, \n\
                  and fans them out to the configured destinations."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "BEACON_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "BEACON_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the dispatch pipeline over an event stream
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "beacon.toml", env = "BEACON_CONFIG")]
    pub config: PathBuf,

    /// Path to a JSON-lines event file (reads stdin when omitted)
    #[arg(short, long, env = "BEACON_INPUT")]
    pub input: Option<PathBuf>,

    /// Maximum number of events to emit (0 = unlimited)
    #[arg(long, default_value = "0", env = "BEACON_MAX_EVENTS")]
    pub max_events: u64,

    /// Comma-separated consent categories to grant, e.g. "analytics,marketing"
    #[arg(long, env = "BEACON_CONSENT")]
    pub consent: Option<String>,

    /// Validate configuration and exit without running the pipeline
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "BEACON_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "beacon.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "beacon.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the declared event catalog
    #[arg(long)]
    pub events: bool,

    /// Show destination configuration
    #[arg(long)]
    pub destinations: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
