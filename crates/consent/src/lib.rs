//! # Consent
//!
//! Consent gate: decides per event whether delivery is permitted.
//!
//! Responsibilities:
//! - Resolve every event to exactly one consent category
//! - Answer whether that category is currently granted
//! - Hold the mutable consent state behind a copy-only surface

mod gate;

pub use contracts::{ConsentRules, ConsentState};
pub use gate::ConsentGate;
