//! TrackedEvent - the unit of work flowing through the dispatch pipeline

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::EventKey;

/// Ordered string-keyed mapping used for event payloads and metadata.
///
/// `serde_json::Map` with the `preserve_order` feature keeps insertion
/// order, so payload fields reach destinations in the order the caller
/// built them.
pub type Payload = serde_json::Map<String, Value>;

/// One occurrence of a tracked action.
///
/// Created once per logical occurrence, flows through consent gate,
/// middleware chain and fan-out, and is discarded after delivery or drop.
/// The pipeline never retains it; destinations may.
///
/// Invariants:
/// - `key` is always `"{area}::{name}"`.
/// - `timestamp_ms` is assigned exactly once at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedEvent {
    /// Stable identifier, `area::name`
    pub key: EventKey,

    /// Functional area the event belongs to (e.g. "checkout")
    pub area: String,

    /// Event name within the area (e.g. "purchase")
    pub name: String,

    /// Caller-provided payload fields, order preserved
    #[serde(default)]
    pub payload: Payload,

    /// Wall-clock milliseconds at creation
    pub timestamp_ms: i64,

    /// Cross-cutting annotations, mutable across middleware
    #[serde(default)]
    pub metadata: Payload,
}

impl TrackedEvent {
    /// Create a new event, stamping the current wall clock time.
    pub fn new(area: impl Into<String>, name: impl Into<String>, payload: Payload) -> Self {
        let area = area.into();
        let name = name.into();
        Self {
            key: EventKey::compose(&area, &name),
            area,
            name,
            payload,
            timestamp_ms: Utc::now().timestamp_millis(),
            metadata: Payload::new(),
        }
    }

    /// Create a new event with pre-populated metadata.
    pub fn with_metadata(
        area: impl Into<String>,
        name: impl Into<String>,
        payload: Payload,
        metadata: Payload,
    ) -> Self {
        let mut event = Self::new(area, name, payload);
        event.metadata = metadata;
        event
    }
}
