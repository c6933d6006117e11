//! Middleware contract - chainable transform/filter steps
//!
//! A middleware receives the current event and a continuation. Calling the
//! continuation exactly once, synchronously, passes a possibly modified
//! event onward; declining to call it drops the event. Calling it more
//! than once is a programming error the chain surfaces as
//! `PipelineError::ChainMisuse`. Drop detection is purely a consequence of
//! the middleware's own control flow; there is no timing heuristic.

use std::cell::{Cell, RefCell};

use crate::TrackedEvent;

/// Continuation handed to each middleware.
///
/// Not `Send` by design: a middleware must resolve within its own
/// synchronous invocation, so the continuation never crosses tasks.
pub struct Next {
    slot: RefCell<Option<TrackedEvent>>,
    calls: Cell<u32>,
}

impl Next {
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(None),
            calls: Cell::new(0),
        }
    }

    /// Pass control onward with a possibly modified event.
    ///
    /// Only the first call forwards; further calls are recorded so the
    /// chain can fail the event even when the middleware swallows the
    /// misuse.
    pub fn proceed(&self, event: TrackedEvent) {
        let calls = self.calls.get() + 1;
        self.calls.set(calls);
        if calls == 1 {
            *self.slot.borrow_mut() = Some(event);
        }
    }

    /// How many times `proceed` was invoked.
    pub fn call_count(&self) -> u32 {
        self.calls.get()
    }

    /// Consume the continuation, yielding the forwarded event if any.
    pub fn into_forwarded(self) -> Option<TrackedEvent> {
        self.slot.into_inner()
    }
}

impl Default for Next {
    fn default() -> Self {
        Self::new()
    }
}

/// One transform/filter step applied to an event before delivery.
pub trait Middleware: Send + Sync {
    fn handle(&self, event: TrackedEvent, next: &Next);
}

impl<F> Middleware for F
where
    F: Fn(TrackedEvent, &Next) + Send + Sync,
{
    fn handle(&self, event: TrackedEvent, next: &Next) {
        self(event, next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Payload;

    #[test]
    fn test_proceed_forwards_first_event_only() {
        let next = Next::new();
        next.proceed(TrackedEvent::new("a", "first", Payload::new()));
        next.proceed(TrackedEvent::new("a", "second", Payload::new()));

        assert_eq!(next.call_count(), 2);
        let forwarded = next.into_forwarded().unwrap();
        assert_eq!(forwarded.name, "first");
    }

    #[test]
    fn test_declining_leaves_nothing_forwarded() {
        let next = Next::new();
        assert_eq!(next.call_count(), 0);
        assert!(next.into_forwarded().is_none());
    }
}
