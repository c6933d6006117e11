//! Configuration parsing
//!
//! Supports TOML (primary) and JSON (optional) formats.

use contracts::{PipelineBlueprint, PipelineError};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML format (recommended)
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<PipelineBlueprint, PipelineError> {
    toml::from_str(content).map_err(|e| PipelineError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<PipelineBlueprint, PipelineError> {
    serde_json::from_str(content).map_err(|e| PipelineError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration according to format
pub fn parse(content: &str, format: ConfigFormat) -> Result<PipelineBlueprint, PipelineError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::DestinationKind;

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[consent]
default_category = "analytics"

[consent.default_state]
analytics = true

[consent.mapping]
"checkout::purchase" = "necessary"
"nav::*" = "analytics"

[queue]
enabled = true
max_size = 25
flush_interval_ms = 2000

[[destinations]]
name = "console"
kind = "log"

[[destinations]]
name = "collector"
kind = "http"
[destinations.params]
endpoint = "http://localhost:8080/collect"

[[events]]
area = "checkout"
name = "purchase"

[global_metadata]
app = "storefront"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let blueprint = result.unwrap();
        assert_eq!(blueprint.destinations.len(), 2);
        assert_eq!(blueprint.destinations[1].kind, DestinationKind::Http);
        assert!(blueprint.queue.enabled);
        assert_eq!(blueprint.queue.max_size, 25);
        assert_eq!(
            blueprint.consent.mapping["checkout::purchase"],
            "necessary"
        );
        assert_eq!(blueprint.events.len(), 1);
        assert_eq!(blueprint.global_metadata["app"], "storefront");
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "destinations": [
                { "name": "console", "kind": "log" },
                { "name": "archive", "kind": "file", "params": { "path": "/tmp/events.jsonl" } }
            ]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let blueprint = result.unwrap();
        assert_eq!(blueprint.destinations.len(), 2);
        assert!(!blueprint.queue.enabled);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, PipelineError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
