//! Destination implementations
//!
//! Contains LogDestination, FileDestination, HttpDestination and the
//! in-memory test destination, plus the config-driven factory.

mod file;
mod http;
mod log;
mod memory;

pub use self::file::FileDestination;
pub use self::http::HttpDestination;
pub use self::log::LogDestination;
pub use self::memory::MemoryDestination;

use std::sync::Arc;

use contracts::{Destination, DestinationConfig, DestinationKind};
use tracing::instrument;

use crate::error::DispatcherError;

/// Create a destination from configuration
#[instrument(
    name = "dispatcher_create_destination",
    skip(config),
    fields(destination = %config.name, kind = ?config.kind)
)]
pub fn create_destination(
    config: &DestinationConfig,
) -> Result<Arc<dyn Destination>, DispatcherError> {
    match config.kind {
        DestinationKind::Log => Ok(Arc::new(LogDestination::new(&config.name))),
        DestinationKind::File => {
            let destination = FileDestination::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::destination_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(destination))
        }
        DestinationKind::Http => {
            let destination = HttpDestination::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::destination_creation(&config.name, e.to_string()))?;
            Ok(Arc::new(destination))
        }
        DestinationKind::Memory => Ok(Arc::new(MemoryDestination::new(&config.name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_factory_builds_log_destination() {
        let config = DestinationConfig {
            name: "console".to_string(),
            kind: DestinationKind::Log,
            params: HashMap::new(),
        };
        let destination = create_destination(&config).unwrap();
        assert_eq!(destination.name(), "console");
    }

    #[test]
    fn test_factory_rejects_http_without_endpoint() {
        let config = DestinationConfig {
            name: "collector".to_string(),
            kind: DestinationKind::Http,
            params: HashMap::new(),
        };
        let err = create_destination(&config).err().unwrap();
        assert!(err.to_string().contains("collector"));
    }
}
