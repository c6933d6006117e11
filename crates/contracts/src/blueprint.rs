//! PipelineBlueprint - Config Loader output
//!
//! Describes a complete pipeline configuration: consent rules, batching,
//! destination routing, the declared event catalog and global metadata.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{BatchSettings, Payload};

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Consent section
    #[serde(default)]
    pub consent: ConsentSection,

    /// Batching queue settings
    #[serde(default)]
    pub queue: BatchSettings,

    /// Destination routing configuration
    pub destinations: Vec<DestinationConfig>,

    /// Declared event catalog; empty allows free-form events
    #[serde(default)]
    pub events: Vec<EventDef>,

    /// Metadata merged into every event's metadata
    #[serde(default)]
    pub global_metadata: Payload,
}

/// Consent configuration: initial grants plus pattern rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsentSection {
    /// Initial grant status per category
    #[serde(default)]
    pub default_state: HashMap<String, bool>,

    /// Pattern (exact key / area / `area::*`) -> category
    #[serde(default)]
    pub mapping: HashMap<String, String>,

    /// Category used when no pattern matches
    #[serde(default = "default_consent_category")]
    pub default_category: String,
}

fn default_consent_category() -> String {
    crate::DEFAULT_CATEGORY.to_string()
}

impl Default for ConsentSection {
    fn default() -> Self {
        Self {
            default_state: HashMap::new(),
            mapping: HashMap::new(),
            default_category: default_consent_category(),
        }
    }
}

/// Kind of built-in destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationKind {
    /// Log event summaries via tracing
    Log,
    /// Append JSON lines to a file
    File,
    /// POST JSON to an HTTP collector
    Http,
    /// Buffer events in memory (testing / demos)
    Memory,
}

/// One destination's routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Stable destination name
    pub name: String,

    /// Built-in destination kind
    pub kind: DestinationKind,

    /// Kind-specific parameters (e.g. `endpoint`, `path`)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

/// One declared catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDef {
    /// Functional area
    pub area: String,

    /// Event name within the area
    pub name: String,
}
