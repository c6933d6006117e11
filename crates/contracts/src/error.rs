//! Layered error definitions
//!
//! Categorized by source: config / middleware chain / queue / destination.
//! Consent denial and middleware drops are intentional outcomes, not
//! errors, and never appear here.

use std::fmt;
use thiserror::Error;

/// Failure raised by a destination adapter itself.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The destination's collector endpoint is missing or unreachable
    #[error("collector unavailable: {message}")]
    CollectorUnavailable { message: String },

    /// Transport-level failure (HTTP status, connection reset, ...)
    #[error("transport error: {message}")]
    Transport { message: String },

    /// Payload could not be serialized to the wire format
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl DeliveryError {
    pub fn collector_unavailable(message: impl Into<String>) -> Self {
        Self::CollectorUnavailable {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }
}

/// Which lifecycle call of a destination failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationAction {
    Init,
    Send,
    SendBatch,
    Destroy,
}

impl fmt::Display for DestinationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Init => "init",
            Self::Send => "send",
            Self::SendBatch => "send_batch",
            Self::Destroy => "destroy",
        };
        f.write_str(s)
    }
}

/// One destination's failure, isolated from its siblings.
#[derive(Debug, Error)]
#[error("destination '{destination}' failed during {action}: {cause}")]
pub struct DestinationError {
    /// Stable destination name for diagnostics
    pub destination: String,
    /// Lifecycle call that failed
    pub action: DestinationAction,
    #[source]
    pub cause: DeliveryError,
}

impl DestinationError {
    pub fn new(
        destination: impl Into<String>,
        action: DestinationAction,
        cause: DeliveryError,
    ) -> Self {
        Self {
            destination: destination.into(),
            action,
            cause,
        }
    }
}

/// Unified pipeline error type
#[derive(Debug, Error)]
pub enum PipelineError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Middleware Chain Errors =====
    /// Continuation invoked more than once for one event. Fatal to that
    /// event's delivery, never to the pipeline.
    #[error("middleware continuation invoked more than once for event '{event_key}'")]
    ChainMisuse { event_key: String },

    // ===== Queue Errors =====
    /// Push after destroy is a caller error
    #[error("batch queue is closed")]
    QueueClosed,

    // ===== Destination Errors =====
    /// One destination's init/send/send_batch/destroy failed
    #[error(transparent)]
    Destination(#[from] DestinationError),

    // ===== Catalog Errors =====
    /// Event not declared in the catalog
    #[error("unknown event '{area}::{name}' not declared in catalog")]
    UnknownEvent { area: String, name: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl PipelineError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create chain misuse error for an event key
    pub fn chain_misuse(event_key: impl Into<String>) -> Self {
        Self::ChainMisuse {
            event_key: event_key.into(),
        }
    }

    /// Create unknown event error
    pub fn unknown_event(area: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownEvent {
            area: area.into(),
            name: name.into(),
        }
    }
}
