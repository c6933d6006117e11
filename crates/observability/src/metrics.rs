//! Pipeline metric recording helpers
//!
//! Thin wrappers over the `metrics` macros so call sites stay one-liners
//! and metric names live in one place.

use metrics::{counter, histogram};

/// Record one event entering the pipeline
pub fn record_event_emitted(area: &str) {
    counter!(
        "beacon_events_emitted_total",
        "area" => area.to_string()
    )
    .increment(1);
}

/// Record a consent denial (expected, silent outcome)
pub fn record_consent_denied(category: &str) {
    counter!(
        "beacon_consent_denied_total",
        "category" => category.to_string()
    )
    .increment(1);
}

/// Record a batch release
pub fn record_batch_released(len: usize) {
    counter!("beacon_batches_released_total").increment(1);
    histogram!("beacon_batch_size").record(len as f64);
}
