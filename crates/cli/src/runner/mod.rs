//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{Runner, RunnerConfig};
pub use stats::RunStats;
