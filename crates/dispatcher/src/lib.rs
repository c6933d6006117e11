//! # Dispatcher
//!
//! Event delivery module.
//!
//! Responsibilities:
//! - Run the middleware chain over events
//! - Fan-out to every registered destination
//! - Isolate destination failures from one another

pub mod chain;
pub mod destinations;
pub mod error;
pub mod fanout;
pub mod metrics;

pub use chain::MiddlewareChain;
pub use contracts::{Destination, Middleware, Next, TrackedEvent};
pub use destinations::{
    create_destination, FileDestination, HttpDestination, LogDestination, MemoryDestination,
};
pub use error::DispatcherError;
pub use fanout::FanOutDispatcher;
pub use metrics::{DeliveryMetrics, MetricsSnapshot};
