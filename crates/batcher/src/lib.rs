//! # Batcher
//!
//! Batching queue for approved events.
//!
//! Responsibilities:
//! - Buffer events and release them as batches on a size or time trigger
//! - Keep the buffer and timer handle encapsulated behind an explicit
//!   push/flush/destroy lifecycle
//! - Guarantee no event is delivered twice or lost between push and flush

mod queue;

pub use queue::{BatchQueue, ReleaseFn};
