use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use velo_geo::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CACHE_MINUTES: u64 = 15;
pub const DEFAULT_LOCATION_THRESHOLD_METERS: f64 = 5000.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Cyclist-relevant condition derived from a provider weather code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTag {
    Stormy,
    Rainy,
    Snowy,
    Foggy,
    Perfect,
    Good,
    Hot,
    Cold,
    #[default]
    Unknown,
}

impl ConditionTag {
    /// Map an OpenWeatherMap condition id plus temperature to a tag.
    /// See: https://openweathermap.org/weather-conditions
    pub fn classify(weather_code: i32, temperature_c: f64) -> Self {
        match weather_code {
            200..=299 => Self::Stormy,
            300..=599 => Self::Rainy,
            600..=699 => Self::Snowy,
            700..=799 => Self::Foggy,
            800 => Self::by_temperature(temperature_c, Self::Perfect),
            code if code > 800 => Self::by_temperature(temperature_c, Self::Good),
            _ => Self::Unknown,
        }
    }

    fn by_temperature(temperature_c: f64, mild: Self) -> Self {
        if temperature_c > 25.0 {
            Self::Hot
        } else if temperature_c < 10.0 {
            Self::Cold
        } else {
            mild
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stormy => "stormy",
            Self::Rainy => "rainy",
            Self::Snowy => "snowy",
            Self::Foggy => "foggy",
            Self::Perfect => "perfect",
            Self::Good => "good",
            Self::Hot => "hot",
            Self::Cold => "cold",
            Self::Unknown => "unknown",
        }
    }

    /// Icon name for the weather card
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Stormy => "cloud_lightning",
            Self::Rainy => "cloud_rain",
            Self::Snowy => "cloud_snow",
            Self::Foggy => "cloud_fog",
            Self::Perfect => "star",
            Self::Good => "thumbs_up",
            Self::Hot => "flame",
            Self::Cold => "snowflake",
            Self::Unknown => "cloud_sun",
        }
    }
}

impl std::fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn classify_condition(weather_code: i32, temperature_c: f64) -> ConditionTag {
    ConditionTag::classify(weather_code, temperature_c)
}

/// Current conditions, already converted to display units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature_c: i32,
    pub feels_like_c: i32,
    pub humidity_pct: i32,
    pub wind_speed_kmh: i32,
    pub wind_direction_deg: i32,
    pub description: String,
    pub icon: String,
    pub condition: ConditionTag,
    pub visibility_km: f64,
}

/// Three-hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: DateTime<Utc>,
    pub temperature_c: i32,
    pub condition: ConditionTag,
    pub description: String,
    pub wind_speed_kmh: i32,
    pub precipitation_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideRecommendation {
    pub can_ride: bool,
    pub message: String,
    pub gear: Vec<String>,
}

/// The single cached weather result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherCacheEntry {
    pub data: WeatherSnapshot,
    pub location: Coordinate,
    pub fetched_at_millis: i64,
    pub expires_at_millis: i64,
}

/// Diagnostic view of the cache slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub has_data: bool,
    pub is_expired: bool,
    pub age_millis: Option<i64>,
    pub expires_in_millis: Option<i64>,
    pub location: Option<Coordinate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub cache_duration: Duration,
    pub location_threshold_km: f64,
    pub request_timeout: Duration,
    pub synthetic_seed: u64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            cache_duration: Duration::from_secs(DEFAULT_CACHE_MINUTES * 60),
            location_threshold_km: DEFAULT_LOCATION_THRESHOLD_METERS / 1000.0,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            synthetic_seed: 0,
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather request timed out")]
    Timeout,
    #[error("Weather API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No weather API key configured")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_storm_rain_snow_fog() {
        assert_eq!(classify_condition(200, 20.0), ConditionTag::Stormy);
        assert_eq!(classify_condition(299, 20.0), ConditionTag::Stormy);
        assert_eq!(classify_condition(300, 20.0), ConditionTag::Rainy);
        assert_eq!(classify_condition(501, 20.0), ConditionTag::Rainy);
        assert_eq!(classify_condition(599, 20.0), ConditionTag::Rainy);
        assert_eq!(classify_condition(600, 20.0), ConditionTag::Snowy);
        assert_eq!(classify_condition(701, 20.0), ConditionTag::Foggy);
        assert_eq!(classify_condition(799, 20.0), ConditionTag::Foggy);
    }

    #[test]
    fn test_classify_clear_sky_by_temperature() {
        assert_eq!(classify_condition(800, 15.0), ConditionTag::Perfect);
        assert_eq!(classify_condition(800, 10.0), ConditionTag::Perfect);
        assert_eq!(classify_condition(800, 25.0), ConditionTag::Perfect);
        assert_eq!(classify_condition(800, 25.1), ConditionTag::Hot);
        assert_eq!(classify_condition(800, 9.9), ConditionTag::Cold);
    }

    #[test]
    fn test_classify_clouds_by_temperature() {
        assert_eq!(classify_condition(801, 28.0), ConditionTag::Hot);
        assert_eq!(classify_condition(804, 18.0), ConditionTag::Good);
        assert_eq!(classify_condition(802, 2.0), ConditionTag::Cold);
    }

    #[test]
    fn test_classify_unknown() {
        assert_eq!(classify_condition(199, 20.0), ConditionTag::Unknown);
        assert_eq!(classify_condition(0, 20.0), ConditionTag::Unknown);
        assert_eq!(classify_condition(-1, 20.0), ConditionTag::Unknown);
    }

    #[test]
    fn test_condition_serde_is_lowercase() {
        let json = serde_json::to_string(&ConditionTag::Perfect).unwrap();
        assert_eq!(json, "\"perfect\"");
        assert_eq!(ConditionTag::Stormy.to_string(), "stormy");
    }

    #[test]
    fn test_default_settings() {
        let settings = WeatherSettings::default();
        assert_eq!(settings.cache_duration, Duration::from_secs(900));
        assert_eq!(settings.location_threshold_km, 5.0);
        assert_eq!(settings.request_timeout, Duration::from_secs(10));
        assert!(settings.api_key.is_none());
    }
}
