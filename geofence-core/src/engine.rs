//! Engine facade — wires the region store, per-device sessions, and the
//! event dispatcher into one ingest boundary.

use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::{EventDispatcher, EventHandler, SubscriptionId};
use crate::fence::Geofence;
use crate::session::DeviceSession;
use crate::store::RegionStore;
use crate::types::{EventKind, GeofenceEvent, PositionSample, SampleError, ValidationError};

/// Geofence evaluation engine for any number of device streams.
///
/// Single-owner core: `ingest` takes `&mut self` and is meant to be
/// called from one evaluation thread. The region store is shared behind
/// an `Arc`, so hosts can read definitions from other threads; each
/// ingest snapshots the eligible regions at the sample's timestamp.
/// Deactivation and removal must go through the engine, which clears the
/// matching membership state; writing through the raw store handle skips
/// that cleanup.
pub struct GeofenceEngine {
    store: Arc<RegionStore>,
    sessions: HashMap<String, DeviceSession>,
    dispatcher: EventDispatcher,

    // Counters
    pub samples_ingested: u64,
    pub samples_rejected: u64,
    pub events_emitted: u64,
}

impl GeofenceEngine {
    pub fn new() -> Self {
        Self::with_store(Arc::new(RegionStore::new()))
    }

    /// Build around an existing store handle, e.g. one pre-loaded by the
    /// host before the engine starts.
    pub fn with_store(store: Arc<RegionStore>) -> Self {
        GeofenceEngine {
            store,
            sessions: HashMap::new(),
            dispatcher: EventDispatcher::new(),
            samples_ingested: 0,
            samples_rejected: 0,
            events_emitted: 0,
        }
    }

    /// Shared handle to the region store, for concurrent readers.
    pub fn store(&self) -> Arc<RegionStore> {
        Arc::clone(&self.store)
    }

    /// Register or replace a geofence definition.
    ///
    /// Replacing a region with `active == false` clears its membership
    /// state in every session: no synthetic exit is emitted, and a later
    /// reactivation starts from outside with a fresh alert budget.
    /// Replacing an active region keeps existing membership state.
    pub fn upsert_geofence(&mut self, fence: Geofence) -> Result<(), ValidationError> {
        let deactivated = !fence.active;
        let id = fence.id.clone();
        self.store.upsert(fence)?;
        if deactivated {
            for session in self.sessions.values_mut() {
                session.clear_region(&id);
            }
        }
        Ok(())
    }

    /// Remove a geofence and all membership state referring to it.
    pub fn remove_geofence(&mut self, id: &str) -> bool {
        let removed = self.store.remove(id);
        if removed {
            for session in self.sessions.values_mut() {
                session.clear_region(id);
            }
        }
        removed
    }

    /// Snapshot of every registered definition, in insertion order.
    pub fn list_geofences(&self) -> Vec<Geofence> {
        self.store.list()
    }

    /// Drop all membership state for a device. Returns `false` if the
    /// device was never seen.
    pub fn reset_device(&mut self, device_id: &str) -> bool {
        self.sessions.remove(device_id).is_some()
    }

    /// Number of devices with live sessions.
    pub fn device_count(&self) -> usize {
        self.sessions.len()
    }

    /// Register an event listener. `None` receives both kinds.
    pub fn subscribe(&mut self, filter: Option<EventKind>, handler: EventHandler) -> SubscriptionId {
        self.dispatcher.subscribe(filter, handler)
    }

    /// Remove a previously registered listener.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    /// Listener failures counted by the dispatcher since startup.
    pub fn listener_failures(&self) -> u64 {
        self.dispatcher.listener_failures
    }

    /// Feed one position sample for a device.
    ///
    /// Publishes each produced event to subscribers and returns the same
    /// batch to the caller. Rejected samples mutate nothing.
    pub fn ingest(
        &mut self,
        device_id: &str,
        sample: &PositionSample,
    ) -> Result<Vec<GeofenceEvent>, SampleError> {
        if let Err(err) = sample.validate() {
            self.samples_rejected += 1;
            return Err(err);
        }

        let eligible = self.store.eligible(sample.timestamp);
        let session = self
            .sessions
            .entry(device_id.to_string())
            .or_insert_with(|| DeviceSession::new(device_id));

        let events = match session.observe(&eligible, sample) {
            Ok(events) => events,
            Err(err) => {
                self.samples_rejected += 1;
                return Err(err);
            }
        };

        self.samples_ingested += 1;
        self.events_emitted += events.len() as u64;
        for event in &events {
            self.dispatcher.publish(event);
        }
        Ok(events)
    }
}

impl Default for GeofenceEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
