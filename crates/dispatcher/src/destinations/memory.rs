//! MemoryDestination - in-memory recording destination
//!
//! Used as a test double across the workspace and for demos. Ships in src
//! so downstream crates can build deterministic pipelines without I/O.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use contracts::{DeliveryError, Destination, TrackedEvent};

/// Destination that records every delivered event in memory.
pub struct MemoryDestination {
    name: String,
    batch_capable: bool,
    fail_sends: AtomicBool,
    events: Mutex<Vec<TrackedEvent>>,
    batch_sizes: Mutex<Vec<usize>>,
    init_count: AtomicU64,
    destroy_count: AtomicU64,
}

impl MemoryDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batch_capable: false,
            fail_sends: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            batch_sizes: Mutex::new(Vec::new()),
            init_count: AtomicU64::new(0),
            destroy_count: AtomicU64::new(0),
        }
    }

    /// Advertise a real batch path.
    pub fn with_batch_support(mut self) -> Self {
        self.batch_capable = true;
        self
    }

    /// Make every subsequent send/send_batch fail.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Events recorded so far, in delivery order.
    pub fn recorded(&self) -> Vec<TrackedEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Keys of recorded events, in delivery order.
    pub fn recorded_keys(&self) -> Vec<String> {
        self.recorded().iter().map(|e| e.key.to_string()).collect()
    }

    /// Sizes of batches delivered through `send_batch`.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn init_count(&self) -> u64 {
        self.init_count.load(Ordering::SeqCst)
    }

    pub fn destroy_count(&self) -> u64 {
        self.destroy_count.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> Result<(), DeliveryError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            Err(DeliveryError::transport("simulated delivery failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_batch(&self) -> bool {
        self.batch_capable
    }

    async fn init(&self) -> Result<(), DeliveryError> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn send(&self, event: &TrackedEvent) -> Result<(), DeliveryError> {
        self.check_failure()?;
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
        Ok(())
    }

    async fn send_batch(&self, events: &[TrackedEvent]) -> Result<(), DeliveryError> {
        self.check_failure()?;
        self.batch_sizes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(events.len());
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(events);
        Ok(())
    }

    async fn destroy(&self) -> Result<(), DeliveryError> {
        self.destroy_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
