//! BatchQueue - size- and time-triggered event batching

use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use contracts::{BatchSettings, PipelineError, TrackedEvent};

/// Callback receiving a released batch. Runs the middleware + fan-out path
/// downstream; the queue awaits its completion before accepting the next
/// flush.
pub type ReleaseFn =
    Arc<dyn Fn(Vec<TrackedEvent>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

struct Inner {
    /// Pending events; exclusively owned, never exposed to callers
    buffer: Mutex<Vec<TrackedEvent>>,
    /// Serializes flushes so two snapshots can never overlap
    flush_gate: tokio::sync::Mutex<()>,
    release: ReleaseFn,
    max_size: usize,
    closed: AtomicBool,
    shutdown: Notify,
}

impl Inner {
    /// Flush through the gate. Waits if another flush is in flight.
    async fn flush(&self) {
        let _gate = self.flush_gate.lock().await;
        self.flush_locked().await;
    }

    /// Take the whole buffer atomically and release it. Caller must hold
    /// the flush gate.
    async fn flush_locked(&self) {
        let batch = {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            mem::take(&mut *buffer)
        };

        if batch.is_empty() {
            return;
        }

        debug!(len = batch.len(), "releasing batch");
        (self.release)(batch).await;
    }
}

/// Queue that buffers approved events and releases them in batches.
///
/// A batch is released when the buffer reaches `max_size` (synchronously,
/// as part of the `push` that crossed the threshold) or when the periodic
/// timer fires. `flush_interval_ms == 0` disables the timer.
pub struct BatchQueue {
    inner: Arc<Inner>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl BatchQueue {
    pub fn new(settings: BatchSettings, release: ReleaseFn) -> Self {
        let max_size = if settings.max_size == 0 {
            warn!("max_size of 0 is invalid, clamping to 1");
            1
        } else {
            settings.max_size
        };

        let inner = Arc::new(Inner {
            buffer: Mutex::new(Vec::with_capacity(max_size)),
            flush_gate: tokio::sync::Mutex::new(()),
            release,
            max_size,
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });

        let timer = if settings.flush_interval_ms > 0 {
            Some(spawn_timer(
                Arc::clone(&inner),
                Duration::from_millis(settings.flush_interval_ms),
            ))
        } else {
            None
        };

        Self {
            inner,
            timer: Mutex::new(timer),
        }
    }

    /// Append an event; flushes inline before returning if the buffer
    /// reached `max_size`.
    pub async fn push(&self, event: TrackedEvent) -> Result<(), PipelineError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(PipelineError::QueueClosed);
        }

        let len = {
            let mut buffer = self.inner.buffer.lock().unwrap_or_else(|e| e.into_inner());
            buffer.push(event);
            buffer.len()
        };

        if len >= self.inner.max_size {
            debug!(len, "size threshold reached, flushing");
            self.inner.flush().await;
        }

        Ok(())
    }

    /// Release whatever is currently buffered. No-op on an empty buffer.
    pub async fn flush(&self) {
        self.inner.flush().await;
    }

    /// Number of events currently buffered.
    pub fn pending(&self) -> usize {
        self.inner
            .buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Stop the timer permanently, then drain any remainder with one final
    /// flush. An in-flight flush is allowed to finish first, never
    /// cancelled. Subsequent pushes fail with `QueueClosed`.
    pub async fn destroy(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);

        let timer = {
            let mut guard = self.timer.lock().unwrap_or_else(|e| e.into_inner());
            guard.take()
        };

        if let Some(handle) = timer {
            self.inner.shutdown.notify_one();
            if let Err(e) = handle.await {
                warn!(error = ?e, "batch timer task panicked");
            }
        }

        self.inner.flush().await;
        debug!("batch queue destroyed");
    }
}

/// Periodic flush driver. A tick that finds a flush already in flight is
/// skipped rather than queued, so buffer snapshots never overlap.
fn spawn_timer(inner: Arc<Inner>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of `interval` completes immediately; consume it so
        // the first flush happens one full interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match inner.flush_gate.try_lock() {
                        Ok(_gate) => inner.flush_locked().await,
                        Err(_) => debug!("flush in flight, skipping timer tick"),
                    }
                }
                _ = inner.shutdown.notified() => break,
            }
        }
    })
}
