//! Membership evaluation — decides whether a position sample is inside a
//! geofence.
//!
//! Pure and deterministic: same fence + same sample always gives the same
//! answer, nothing is mutated. Activation (`active` flag, window) is the
//! store's eligibility concern and is not checked here.

use crate::fence::Geofence;
use crate::geo;
use crate::types::PositionSample;

/// Outcome of evaluating one sample against one fence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Membership {
    pub inside: bool,
    /// Great-circle distance from the fence center, meters. Reported for
    /// outside results too.
    pub distance_m: f64,
}

/// Evaluate `sample` against `fence`.
///
/// Gates apply in order: radius (boundary inclusive), sector, altitude.
/// A sample exactly at the center of a directional fence has no defined
/// bearing and fails the sector gate. A sample without altitude never
/// satisfies an altitude band.
pub fn evaluate(fence: &Geofence, sample: &PositionSample) -> Membership {
    let distance_m = geo::haversine_m(
        fence.latitude,
        fence.longitude,
        sample.latitude,
        sample.longitude,
    );
    if distance_m > fence.radius_meters {
        return Membership {
            inside: false,
            distance_m,
        };
    }

    if let Some(sector) = &fence.sector {
        if distance_m == 0.0 {
            return Membership {
                inside: false,
                distance_m,
            };
        }
        let bearing = geo::initial_bearing_deg(
            fence.latitude,
            fence.longitude,
            sample.latitude,
            sample.longitude,
        );
        if geo::bearing_delta_deg(bearing, sector.bearing) > sector.half_width {
            return Membership {
                inside: false,
                distance_m,
            };
        }
    }

    if let Some(band) = &fence.altitude {
        match sample.altitude {
            Some(alt) if band.contains(alt) => {}
            _ => {
                return Membership {
                    inside: false,
                    distance_m,
                }
            }
        }
    }

    Membership {
        inside: true,
        distance_m,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
