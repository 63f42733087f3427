//! Geofence definitions — circular regions with optional directional,
//! altitude, and scheduling constraints, plus per-region alert settings.
//!
//! Definitions are validated before they enter the store; evaluation code
//! can assume every stored fence passed `validate()`.

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Directional constraint. Membership additionally requires the bearing
/// from the fence center to the position to fall within `half_width`
/// degrees of `bearing`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sector {
    /// Centerline of the sector, compass degrees [0, 360].
    pub bearing: f64,
    /// Angular reach either side of the centerline, degrees [1, 180].
    pub half_width: f64,
}

/// Altitude constraint in meters. At least one bound must be present,
/// and present bounds must be finite; an open side is `None`, not an
/// infinity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AltitudeBand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ceiling: Option<f64>,
}

impl AltitudeBand {
    /// Whether `altitude` lies inside the band.
    pub fn contains(&self, altitude: f64) -> bool {
        if let Some(floor) = self.floor {
            if altitude < floor {
                return false;
            }
        }
        if let Some(ceiling) = self.ceiling {
            if altitude > ceiling {
                return false;
            }
        }
        true
    }
}

/// Activation window in Unix seconds. At least one bound must be
/// present, and present bounds must be finite; a missing bound leaves
/// that side open. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<f64>,
}

impl ActiveWindow {
    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: f64) -> bool {
        if let Some(start) = self.start {
            if now < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if now > end {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Alert settings
// ---------------------------------------------------------------------------

/// Consumer-facing urgency label. No effect on evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Normal => write!(f, "normal"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

/// Alert gating for one region. Cooldown and the alert cap are shared
/// across entry and exit per device+region pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlertSettings {
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
    /// Minimum spacing between consecutive alerts, in minutes.
    pub cooldown_minutes: f64,
    /// Lifetime alert cap per device+region pair. Zero means unlimited.
    pub max_alerts: u32,
    pub priority: Priority,
}

impl Default for AlertSettings {
    fn default() -> Self {
        AlertSettings {
            notify_on_entry: true,
            notify_on_exit: true,
            cooldown_minutes: 0.0,
            max_alerts: 0,
            priority: Priority::Normal,
        }
    }
}

// ---------------------------------------------------------------------------
// Geofence definition
// ---------------------------------------------------------------------------

/// A registered region: circular boundary around a center point, with
/// optional sector/altitude/window constraints.
///
/// `active` is the on/off switch: an inactive fence stays in the store
/// but never produces membership or events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of the circular boundary, meters. Boundary is inclusive.
    #[serde(rename = "radius")]
    pub radius_meters: f64,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<Sector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<AltitudeBand>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<ActiveWindow>,
    #[serde(default)]
    pub settings: AlertSettings,
}

fn default_active() -> bool {
    true
}

impl Geofence {
    /// Always-on circular fence with default settings and no constraints.
    pub fn new(id: &str, latitude: f64, longitude: f64, radius_meters: f64) -> Self {
        Geofence {
            id: id.to_string(),
            name: String::new(),
            latitude,
            longitude,
            radius_meters,
            active: true,
            sector: None,
            altitude: None,
            window: None,
            settings: AlertSettings::default(),
        }
    }

    /// Check the definition for malformed fields. The store calls this
    /// before every insert or replace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ValidationError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ValidationError::InvalidLongitude(self.longitude));
        }
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(ValidationError::InvalidRadius(self.radius_meters));
        }
        if let Some(sector) = &self.sector {
            if !sector.bearing.is_finite() || !(0.0..=360.0).contains(&sector.bearing) {
                return Err(ValidationError::InvalidSectorBearing(sector.bearing));
            }
            if !sector.half_width.is_finite() || !(1.0..=180.0).contains(&sector.half_width) {
                return Err(ValidationError::InvalidSectorWidth(sector.half_width));
            }
        }
        if let Some(band) = &self.altitude {
            match (band.floor, band.ceiling) {
                (None, None) => return Err(ValidationError::EmptyAltitudeBand),
                (Some(floor), _) if !floor.is_finite() => {
                    return Err(ValidationError::InvalidAltitudeBound(floor));
                }
                (_, Some(ceiling)) if !ceiling.is_finite() => {
                    return Err(ValidationError::InvalidAltitudeBound(ceiling));
                }
                (Some(floor), Some(ceiling)) if floor > ceiling => {
                    return Err(ValidationError::AltitudeBandInverted { floor, ceiling });
                }
                _ => {}
            }
        }
        if let Some(window) = &self.window {
            match (window.start, window.end) {
                (None, None) => return Err(ValidationError::EmptyActiveWindow),
                (Some(start), _) if !start.is_finite() => {
                    return Err(ValidationError::InvalidWindowBound(start));
                }
                (_, Some(end)) if !end.is_finite() => {
                    return Err(ValidationError::InvalidWindowBound(end));
                }
                (Some(start), Some(end)) if start > end => {
                    return Err(ValidationError::WindowInverted { start, end });
                }
                _ => {}
            }
        }
        if !self.settings.cooldown_minutes.is_finite() || self.settings.cooldown_minutes < 0.0 {
            return Err(ValidationError::InvalidCooldown(self.settings.cooldown_minutes));
        }
        Ok(())
    }

    /// Whether the fence should be evaluated at time `now`: active, and
    /// inside its activation window if it has one.
    pub fn eligible_at(&self, now: f64) -> bool {
        self.active && self.window.map_or(true, |w| w.contains(now))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_defaults() {
        let fence: Geofence = serde_json::from_str(
            r#"{"id":"mk","latitude":28.4177,"longitude":-81.5812,"radius":200.0}"#,
        )
        .unwrap();
        assert!(fence.active);
        assert_eq!(fence.name, "");
        assert!(fence.sector.is_none());
        assert!(fence.settings.notify_on_entry);
        assert!(fence.settings.notify_on_exit);
        assert_eq!(fence.settings.cooldown_minutes, 0.0);
        assert_eq!(fence.settings.max_alerts, 0);
        assert_eq!(fence.settings.priority, Priority::Normal);
        assert!(fence.validate().is_ok());
    }

    #[test]
    fn test_settings_json() {
        let fence: Geofence = serde_json::from_str(
            r#"{"id":"mk","latitude":0,"longitude":0,"radius":100,
                "settings":{"notifyOnExit":false,"cooldownMinutes":5,"maxAlerts":3,"priority":"high"}}"#,
        )
        .unwrap();
        assert!(fence.settings.notify_on_entry, "unset flag keeps default");
        assert!(!fence.settings.notify_on_exit);
        assert_eq!(fence.settings.cooldown_minutes, 5.0);
        assert_eq!(fence.settings.max_alerts, 3);
        assert_eq!(fence.settings.priority, Priority::High);
    }

    #[test]
    fn test_validate_rejects_empty_id() {
        let fence = Geofence::new("  ", 0.0, 0.0, 100.0);
        assert!(matches!(fence.validate(), Err(ValidationError::EmptyId)));
    }

    #[test]
    fn test_validate_rejects_bad_center() {
        let fence = Geofence::new("a", 90.5, 0.0, 100.0);
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidLatitude(_))
        ));
        let fence = Geofence::new("a", 0.0, 181.0, 100.0);
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_radius() {
        for radius in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let fence = Geofence::new("a", 0.0, 0.0, radius);
            assert!(
                matches!(fence.validate(), Err(ValidationError::InvalidRadius(_))),
                "radius {radius} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_rejects_bad_sector() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.sector = Some(Sector {
            bearing: 361.0,
            half_width: 45.0,
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidSectorBearing(_))
        ));

        fence.sector = Some(Sector {
            bearing: 0.0,
            half_width: 0.5,
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidSectorWidth(_))
        ));

        fence.sector = Some(Sector {
            bearing: 0.0,
            half_width: 180.5,
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidSectorWidth(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_altitude_band() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.altitude = Some(AltitudeBand {
            floor: None,
            ceiling: None,
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::EmptyAltitudeBand)
        ));

        fence.altitude = Some(AltitudeBand {
            floor: Some(1000.0),
            ceiling: Some(500.0),
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::AltitudeBandInverted { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_band_bounds() {
        // A NaN floor slips past a plain floor > ceiling comparison and
        // would leave a band that matches every altitude.
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.altitude = Some(AltitudeBand {
            floor: Some(f64::NAN),
            ceiling: Some(1000.0),
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidAltitudeBound(_))
        ));

        fence.altitude = Some(AltitudeBand {
            floor: Some(500.0),
            ceiling: Some(f64::INFINITY),
        });
        assert!(
            matches!(
                fence.validate(),
                Err(ValidationError::InvalidAltitudeBound(_))
            ),
            "an open ceiling is None, not infinity"
        );

        fence.altitude = Some(AltitudeBand {
            floor: Some(f64::NAN),
            ceiling: None,
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidAltitudeBound(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_window() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.window = Some(ActiveWindow {
            start: None,
            end: None,
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::EmptyActiveWindow)
        ));

        fence.window = Some(ActiveWindow {
            start: Some(2000.0),
            end: Some(1000.0),
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::WindowInverted { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_non_finite_window_bounds() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.window = Some(ActiveWindow {
            start: Some(f64::NAN),
            end: Some(2000.0),
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidWindowBound(_))
        ));

        fence.window = Some(ActiveWindow {
            start: None,
            end: Some(f64::NEG_INFINITY),
        });
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidWindowBound(_))
        ));
    }

    #[test]
    fn test_validate_rejects_negative_cooldown() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.settings.cooldown_minutes = -1.0;
        assert!(matches!(
            fence.validate(),
            Err(ValidationError::InvalidCooldown(_))
        ));
    }

    #[test]
    fn test_altitude_band_bounds() {
        let band = AltitudeBand {
            floor: Some(500.0),
            ceiling: Some(1000.0),
        };
        assert!(band.contains(500.0), "floor is inclusive");
        assert!(band.contains(1000.0), "ceiling is inclusive");
        assert!(band.contains(750.0));
        assert!(!band.contains(499.9));
        assert!(!band.contains(1000.1));

        let floor_only = AltitudeBand {
            floor: Some(100.0),
            ceiling: None,
        };
        assert!(floor_only.contains(1.0e6));
        assert!(!floor_only.contains(99.0));
    }

    #[test]
    fn test_eligible_at_inactive() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.active = false;
        assert!(!fence.eligible_at(0.0));
        assert!(!fence.eligible_at(1.0e9));
    }

    #[test]
    fn test_eligible_at_window() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.window = Some(ActiveWindow {
            start: Some(1000.0),
            end: Some(2000.0),
        });
        assert!(!fence.eligible_at(999.9));
        assert!(fence.eligible_at(1000.0), "window start is inclusive");
        assert!(fence.eligible_at(1500.0));
        assert!(fence.eligible_at(2000.0), "window end is inclusive");
        assert!(!fence.eligible_at(2000.1));
    }

    #[test]
    fn test_eligible_at_half_open_window() {
        let mut fence = Geofence::new("a", 0.0, 0.0, 100.0);
        fence.window = Some(ActiveWindow {
            start: Some(1000.0),
            end: None,
        });
        assert!(!fence.eligible_at(500.0));
        assert!(fence.eligible_at(5.0e9));

        fence.window = Some(ActiveWindow {
            start: None,
            end: Some(1000.0),
        });
        assert!(fence.eligible_at(500.0));
        assert!(!fence.eligible_at(1000.1));
    }
}
