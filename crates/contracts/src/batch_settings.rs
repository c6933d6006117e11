//! Batch queue settings

use serde::{Deserialize, Serialize};

/// Default batch size threshold
pub const DEFAULT_MAX_SIZE: usize = 10;

/// Default timer flush interval in milliseconds
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5000;

/// Configuration for the batching queue.
///
/// Batching is off by default; when enabled, events are buffered and
/// released either when the buffer reaches `max_size` or when the periodic
/// timer fires. `flush_interval_ms == 0` disables the timer entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Whether the pipeline batches at all
    #[serde(default)]
    pub enabled: bool,

    /// Buffer size that triggers an immediate flush (must be >= 1)
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Timer flush interval in milliseconds, 0 disables the timer
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

fn default_max_size() -> usize {
    DEFAULT_MAX_SIZE
}

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_INTERVAL_MS
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            max_size: DEFAULT_MAX_SIZE,
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
        }
    }
}
