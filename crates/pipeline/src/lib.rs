//! # Pipeline
//!
//! Event pipeline coordinator.
//!
//! Owns one consent gate, one middleware chain, one fan-out dispatcher and
//! an optional batch queue, and exposes the caller-facing surface:
//! `emit`, `set_consent`, `flush`, `destroy`.

mod catalog;
mod coordinator;

pub use catalog::EventCatalog;
pub use contracts::{
    BatchSettings, ConsentRules, ConsentState, Destination, EventDef, Middleware, Next, Payload,
    PipelineBlueprint, PipelineError, TrackedEvent,
};
pub use coordinator::{default_error_callback, ErrorCallback, Pipeline, PipelineBuilder};
