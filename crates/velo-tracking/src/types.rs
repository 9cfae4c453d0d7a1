use std::sync::Arc;

use serde::{Deserialize, Serialize};
use velo_geo::{Coordinate, SpeedBand};

/// Default accuracy radius below which a fix's movement counts toward distance.
pub const DEFAULT_ACCURACY_GATE_METERS: f64 = 20.0;

/// A single position sample reported by the location provider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub coordinate: Coordinate,
    pub timestamp_millis: i64,
    pub accuracy_meters: f64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp_millis: i64, accuracy_meters: f64) -> Self {
        Self {
            coordinate: Coordinate::new(latitude, longitude),
            timestamp_millis,
            accuracy_meters,
        }
    }

    /// Check coordinates and accuracy radius are usable.
    pub fn validate(&self) -> Result<(), LocationError> {
        if !self.coordinate.is_valid() {
            return Err(LocationError::InvalidFix(format!(
                "coordinate ({}, {}) out of range",
                self.coordinate.latitude, self.coordinate.longitude
            )));
        }
        if !self.accuracy_meters.is_finite() || self.accuracy_meters < 0.0 {
            return Err(LocationError::InvalidFix(format!(
                "accuracy {} is not a non-negative radius",
                self.accuracy_meters
            )));
        }
        Ok(())
    }
}

/// Sampling hint passed to [`crate::LocationProvider::watch`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatchOptions {
    pub desired_interval_millis: u64,
    pub min_distance_meters: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            desired_interval_millis: 1000,
            min_distance_meters: 5.0,
        }
    }
}

/// Tunables for a [`crate::TrackingSession`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingSettings {
    pub accuracy_gate_meters: f64,
    /// Add distance from fixes whose timestamp does not advance past the
    /// current fix. Off by default so duplicate deliveries are not
    /// double-counted.
    pub count_zero_interval_distance: bool,
    pub watch: WatchOptions,
}

impl Default for TrackingSettings {
    fn default() -> Self {
        Self {
            accuracy_gate_meters: DEFAULT_ACCURACY_GATE_METERS,
            count_zero_interval_distance: false,
            watch: WatchOptions::default(),
        }
    }
}

/// Point-in-time view of a ride, handed to observers and callers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub is_tracking: bool,
    pub started_at_millis: Option<i64>,
    pub current_fix: Option<LocationFix>,
    pub total_distance_km: f64,
    pub current_speed_kmh: f64,
    pub duration_seconds: u64,
    /// Shared with the session; later fixes don't appear in an older snapshot.
    pub location_history: Arc<Vec<LocationFix>>,
    pub average_speed_kmh: f64,
}

impl TrackingSnapshot {
    pub fn current_position(&self) -> Option<Coordinate> {
        self.current_fix.map(|fix| fix.coordinate)
    }

    /// Coordinates of the ride in recorded order.
    pub fn path(&self) -> Vec<Coordinate> {
        self.location_history.iter().map(|fix| fix.coordinate).collect()
    }

    pub fn estimated_calories(&self) -> u32 {
        velo_geo::estimate_calories(self.total_distance_km)
    }

    pub fn speed_band(&self) -> SpeedBand {
        SpeedBand::from_kmh(self.current_speed_kmh)
    }
}

/// Location service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("No location fix available")]
    NoFix,
    #[error("Invalid location fix: {0}")]
    InvalidFix(String),
}
