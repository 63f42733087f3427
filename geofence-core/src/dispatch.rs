//! Event dispatch — listener registry with per-listener failure isolation.
//!
//! Delivery is synchronous, at most once, in subscription order. A
//! listener that fails or panics is logged and skipped; the rest still
//! run, and nothing propagates to the ingest path. Listeners doing slow
//! work (persistence, network delivery) should hand off internally.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::types::{EventKind, GeofenceEvent, ListenerError};

/// Callback invoked for each published event.
pub type EventHandler = Box<dyn Fn(&GeofenceEvent) -> Result<(), ListenerError> + Send>;

/// Opaque handle returned by `subscribe`; the only way to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    filter: Option<EventKind>,
    handler: EventHandler,
}

/// Fan-out of geofence events to registered listeners.
pub struct EventDispatcher {
    subscriptions: Vec<Subscription>,
    next_id: u64,

    // Counters
    pub published: u64,
    pub listener_failures: u64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        EventDispatcher {
            subscriptions: Vec::new(),
            next_id: 1,
            published: 0,
            listener_failures: 0,
        }
    }

    /// Register a listener. A `None` filter receives both entries and
    /// exits; a `Some` filter receives only that kind.
    pub fn subscribe(&mut self, filter: Option<EventKind>, handler: EventHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscriptions.push(Subscription {
            id,
            filter,
            handler,
        });
        id
    }

    /// Remove a listener. Returns `false` if the id was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| s.id != id);
        self.subscriptions.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Deliver one event to every matching listener, isolating failures.
    pub fn publish(&mut self, event: &GeofenceEvent) {
        self.published += 1;
        for sub in &self.subscriptions {
            if let Some(kind) = sub.filter {
                if kind != event.kind {
                    continue;
                }
            }
            match catch_unwind(AssertUnwindSafe(|| (sub.handler)(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.listener_failures += 1;
                    tracing::warn!(
                        "listener failed for {} {}/{}: {err}",
                        event.kind,
                        event.region_id,
                        event.device_id
                    );
                }
                Err(_) => {
                    self.listener_failures += 1;
                    tracing::warn!(
                        "listener panicked for {} {}/{}",
                        event.kind,
                        event.region_id,
                        event.device_id
                    );
                }
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
