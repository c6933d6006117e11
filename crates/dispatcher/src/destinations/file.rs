//! FileDestination - appends events as JSON lines

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{DeliveryError, Destination, TrackedEvent};
use tracing::debug;

/// Configuration for FileDestination
#[derive(Debug, Clone)]
pub struct FileDestinationConfig {
    /// Output file path
    pub path: PathBuf,
}

impl FileDestinationConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./events.jsonl"));

        Self { path }
    }
}

/// Destination that appends one JSON line per event.
///
/// The writer lives behind a `Mutex` because the pipeline may run several
/// dispatch calls against this destination at once.
pub struct FileDestination {
    name: String,
    writer: Mutex<BufWriter<File>>,
}

impl FileDestination {
    /// Create a new FileDestination, opening the file in append mode
    pub fn new(name: impl Into<String>, config: FileDestinationConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileDestinationConfig::from_params(params);
        Self::new(name, config)
    }

    fn write_line(&self, event: &TrackedEvent) -> Result<(), DeliveryError> {
        let line = serde_json::to_vec(event)?;
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.write_all(&line)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

#[async_trait]
impl Destination for FileDestination {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_batch(&self) -> bool {
        true
    }

    async fn send(&self, event: &TrackedEvent) -> Result<(), DeliveryError> {
        self.write_line(event)?;
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.flush()?;
        Ok(())
    }

    async fn send_batch(&self, events: &[TrackedEvent]) -> Result<(), DeliveryError> {
        for event in events {
            self.write_line(event)?;
        }
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.flush()?;
        debug!(destination = %self.name, len = events.len(), "batch written");
        Ok(())
    }

    async fn destroy(&self) -> Result<(), DeliveryError> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writer.flush()?;
        debug!(destination = %self.name, "FileDestination closed");
        Ok(())
    }
}
