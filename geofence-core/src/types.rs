//! Shared types and error enums for geofence-core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejections raised when a geofence definition is created or updated.
/// The store is left unchanged when one of these is returned.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("geofence id must be non-empty")]
    EmptyId,
    #[error("center latitude out of range [-90, 90]: {0}")]
    InvalidLatitude(f64),
    #[error("center longitude out of range [-180, 180]: {0}")]
    InvalidLongitude(f64),
    #[error("radius must be finite and positive, got {0}")]
    InvalidRadius(f64),
    #[error("sector bearing out of range [0, 360]: {0}")]
    InvalidSectorBearing(f64),
    #[error("sector half-width out of range [1, 180]: {0}")]
    InvalidSectorWidth(f64),
    #[error("altitude band needs a floor or a ceiling")]
    EmptyAltitudeBand,
    #[error("altitude bound must be finite, got {0}")]
    InvalidAltitudeBound(f64),
    #[error("altitude floor {floor} above ceiling {ceiling}")]
    AltitudeBandInverted { floor: f64, ceiling: f64 },
    #[error("active window needs a start or an end")]
    EmptyActiveWindow,
    #[error("window bound must be finite, got {0}")]
    InvalidWindowBound(f64),
    #[error("window start {start} after end {end}")]
    WindowInverted { start: f64, end: f64 },
    #[error("cooldown must be finite and non-negative, got {0}")]
    InvalidCooldown(f64),
}

/// Rejections raised for a malformed or out-of-order position sample.
/// No tracker state is mutated when one of these is returned.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample latitude out of range [-90, 90]: {0}")]
    InvalidLatitude(f64),
    #[error("sample longitude out of range [-180, 180]: {0}")]
    InvalidLongitude(f64),
    #[error("sample altitude must be finite, got {0}")]
    InvalidAltitude(f64),
    #[error("sample timestamp must be finite, got {0}")]
    InvalidTimestamp(f64),
    #[error("sample timestamp {sample} older than last processed {last}")]
    OutOfOrder { sample: f64, last: f64 },
}

/// Failure returned by an event listener. Logged and swallowed by the
/// dispatcher; never surfaced to the ingest caller.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ListenerError(pub String);

impl From<&str> for ListenerError {
    fn from(msg: &str) -> Self {
        ListenerError(msg.to_string())
    }
}

// ---------------------------------------------------------------------------
// Position samples (input)
// ---------------------------------------------------------------------------

/// A single device position report. Timestamps are Unix seconds.
///
/// `bearing` is the device's own heading; it is carried through to events
/// untouched. Directional fences gate on the computed center-to-position
/// bearing instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    pub timestamp: f64,
}

impl PositionSample {
    /// Range-check the sample. Altitude is optional but must be finite
    /// when present.
    pub fn validate(&self) -> Result<(), SampleError> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(SampleError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(SampleError::InvalidLongitude(self.longitude));
        }
        if let Some(alt) = self.altitude {
            if !alt.is_finite() {
                return Err(SampleError::InvalidAltitude(alt));
            }
        }
        if !self.timestamp.is_finite() {
            return Err(SampleError::InvalidTimestamp(self.timestamp));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Geofence events (output)
// ---------------------------------------------------------------------------

/// Transition direction of a geofence event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Entry,
    Exit,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Entry => write!(f, "entry"),
            EventKind::Exit => write!(f, "exit"),
        }
    }
}

/// An emitted entry/exit transition. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceEvent {
    pub region_id: String,
    pub device_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub position: PositionSample,
    pub distance_from_center: f64,
    pub timestamp: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
