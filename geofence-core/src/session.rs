//! Per-device transition tracking — membership diffing with alert gating.
//!
//! Pure state machine: call `observe()` with each position sample and the
//! fences eligible at that time, get back the entry/exit events the sample
//! produced. The caller decides what to do with events (dispatch, print).
//!
//! Tracks per device+region: current membership, last alert time, and the
//! number of alerts already sent.

use std::collections::HashMap;

use crate::eval;
use crate::fence::Geofence;
use crate::types::{EventKind, GeofenceEvent, PositionSample, SampleError};

// ---------------------------------------------------------------------------
// Membership state
// ---------------------------------------------------------------------------

/// Bookkeeping for one device+region pair. Created lazily on first
/// evaluation; the initial state is outside.
#[derive(Debug, Clone, Default)]
pub struct MembershipState {
    pub inside: bool,
    /// Timestamp of the last alert for this pair, entry or exit.
    pub last_alert_at: Option<f64>,
    /// Alerts sent so far for this pair, entry and exit combined.
    pub alert_count: u32,
}

// ---------------------------------------------------------------------------
// Device session
// ---------------------------------------------------------------------------

/// Transition tracker for a single device's position stream.
///
/// Samples must arrive in timestamp order: an older sample is rejected,
/// and a sample with the same timestamp as the previous one is a silent
/// no-op so duplicate delivery cannot double-fire alerts.
#[derive(Debug)]
pub struct DeviceSession {
    pub device_id: String,
    pub states: HashMap<String, MembershipState>,
    last_timestamp: Option<f64>,
}

impl DeviceSession {
    pub fn new(device_id: &str) -> Self {
        DeviceSession {
            device_id: device_id.to_string(),
            states: HashMap::new(),
            last_timestamp: None,
        }
    }

    /// Timestamp of the last processed sample, if any.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.last_timestamp
    }

    /// Drop membership bookkeeping for one region. Called when a region
    /// is removed or deactivated; the next evaluation starts from
    /// outside with a fresh alert budget.
    pub fn clear_region(&mut self, region_id: &str) {
        self.states.remove(region_id);
    }

    /// Process one sample against the eligible fences, in the order
    /// given. Returns the events to publish.
    ///
    /// Gating per transition: the matching notify flag must be set, the
    /// cooldown must have elapsed, and the alert budget must allow it.
    /// A suppressed transition still updates the stored membership bit,
    /// so suppression never desynchronizes later diffs.
    pub fn observe(
        &mut self,
        fences: &[Geofence],
        sample: &PositionSample,
    ) -> Result<Vec<GeofenceEvent>, SampleError> {
        sample.validate()?;

        if let Some(last) = self.last_timestamp {
            if sample.timestamp < last {
                return Err(SampleError::OutOfOrder {
                    sample: sample.timestamp,
                    last,
                });
            }
            if sample.timestamp == last {
                // Duplicate delivery of the current sample.
                return Ok(Vec::new());
            }
        }
        self.last_timestamp = Some(sample.timestamp);

        let mut events = Vec::new();
        for fence in fences {
            let membership = eval::evaluate(fence, sample);
            let state = self.states.entry(fence.id.clone()).or_default();
            if membership.inside == state.inside {
                continue;
            }
            state.inside = membership.inside;

            let kind = if membership.inside {
                EventKind::Entry
            } else {
                EventKind::Exit
            };
            let wanted = match kind {
                EventKind::Entry => fence.settings.notify_on_entry,
                EventKind::Exit => fence.settings.notify_on_exit,
            };
            if !wanted {
                continue;
            }
            if let Some(last_alert) = state.last_alert_at {
                if sample.timestamp - last_alert < fence.settings.cooldown_minutes * 60.0 {
                    continue;
                }
            }
            if fence.settings.max_alerts > 0 && state.alert_count >= fence.settings.max_alerts {
                continue;
            }

            state.last_alert_at = Some(sample.timestamp);
            state.alert_count += 1;
            events.push(GeofenceEvent {
                region_id: fence.id.clone(),
                device_id: self.device_id.clone(),
                kind,
                position: sample.clone(),
                distance_from_center: membership.distance_m,
                timestamp: sample.timestamp,
            });
        }
        Ok(events)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
