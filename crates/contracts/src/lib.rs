//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Event timestamps are wall-clock milliseconds, assigned exactly once at
//!   event construction and never recomputed downstream.

mod batch_settings;
mod blueprint;
mod consent;
mod destination;
mod error;
mod event;
mod event_key;
mod middleware;

pub use batch_settings::*;
pub use blueprint::*;
pub use consent::*;
pub use destination::*;
pub use error::*;
pub use event::*;
pub use event_key::EventKey;
pub use middleware::{Middleware, Next};
