//! Ride metric helpers used by the live ride display.

use serde::{Deserialize, Serialize};

/// Rough energy estimate for cycling.
pub const CALORIES_PER_KM: f64 = 50.0;

/// Speed categories used for color-coding the live speed readout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeedBand {
    Stopped,
    Slow,
    Moderate,
    Good,
    Excellent,
}

impl SpeedBand {
    pub fn from_kmh(kmh: f64) -> Self {
        if kmh >= 25.0 {
            Self::Excellent
        } else if kmh >= 18.0 {
            Self::Good
        } else if kmh >= 12.0 {
            Self::Moderate
        } else if kmh >= 6.0 {
            Self::Slow
        } else {
            Self::Stopped
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Slow => "Slow",
            Self::Moderate => "Moderate",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }
}

/// Format elapsed seconds as `HH:MM:SS`.
pub fn format_duration(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

pub fn format_speed(kmh: f64) -> String {
    format!("{:.1} km/h", kmh)
}

pub fn estimate_calories(distance_km: f64) -> u32 {
    if !distance_km.is_finite() || distance_km <= 0.0 {
        return 0;
    }
    (distance_km * CALORIES_PER_KM).round() as u32
}
