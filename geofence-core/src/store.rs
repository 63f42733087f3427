//! Region store — shared, insertion-ordered registry of geofence
//! definitions.
//!
//! Interior `RwLock` so one handle can be cloned across threads:
//! management writes are atomic per id, and readers see either the old or
//! the new definition, never a partial one.

use std::sync::RwLock;

use crate::fence::Geofence;
use crate::types::ValidationError;

/// Registry of geofence definitions keyed by id.
///
/// Insertion order is stable: listing and evaluation walk regions in the
/// order they were first added, and replacing a definition keeps its
/// original position.
pub struct RegionStore {
    fences: RwLock<Vec<Geofence>>,
}

impl RegionStore {
    pub fn new() -> Self {
        RegionStore {
            fences: RwLock::new(Vec::new()),
        }
    }

    /// Insert a new definition or replace the existing one with the same
    /// id. Validation failures leave the store untouched.
    pub fn upsert(&self, fence: Geofence) -> Result<(), ValidationError> {
        fence.validate()?;
        let mut fences = self.fences.write().unwrap();
        match fences.iter_mut().find(|f| f.id == fence.id) {
            Some(slot) => *slot = fence,
            None => fences.push(fence),
        }
        Ok(())
    }

    /// Remove a definition. Returns `false` if the id was unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut fences = self.fences.write().unwrap();
        let before = fences.len();
        fences.retain(|f| f.id != id);
        fences.len() != before
    }

    /// Look up a definition by id.
    pub fn get(&self, id: &str) -> Option<Geofence> {
        self.fences.read().unwrap().iter().find(|f| f.id == id).cloned()
    }

    /// Snapshot of every definition, in insertion order.
    pub fn list(&self) -> Vec<Geofence> {
        self.fences.read().unwrap().clone()
    }

    /// Snapshot of the regions that should be evaluated at time `now`:
    /// active, and inside their activation window if they have one.
    pub fn eligible(&self, now: f64) -> Vec<Geofence> {
        self.fences
            .read()
            .unwrap()
            .iter()
            .filter(|f| f.eligible_at(now))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fences.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.read().unwrap().is_empty()
    }
}

impl Default for RegionStore {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
