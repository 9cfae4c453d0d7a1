use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// Geographic position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate, rejecting non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::InvalidCoordinate(format!(
                "({}, {}) is outside [-90,90] x [-180,180]",
                latitude, longitude
            )))
        }
    }

    /// True when both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Latitude clamped to the poles, longitude wrapped into [-180, 180].
    ///
    /// Non-finite input is returned unchanged; callers should check
    /// `is_valid` for that case.
    pub fn clamped(&self) -> Self {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return *self;
        }
        let latitude = self.latitude.clamp(-90.0, 90.0);
        let longitude = if (-180.0..=180.0).contains(&self.longitude) {
            self.longitude
        } else {
            (self.longitude + 180.0).rem_euclid(360.0) - 180.0
        };
        Self::new(latitude, longitude)
    }

    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}
