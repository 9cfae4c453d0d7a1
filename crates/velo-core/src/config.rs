use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use velo_tracking::{TrackingSettings, WatchOptions};
use velo_weather::WeatherSettings;

use crate::error::ConfigError;

/// Environment variable consulted when no API key is in the config file
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// GPS tracking settings
    #[serde(default)]
    pub tracking: TrackingConfig,

    /// Weather settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Fixes with an accuracy radius at or above this don't add distance
    #[serde(default = "default_accuracy_gate")]
    pub accuracy_gate_meters: f64,

    /// Sampling hint passed to the location provider
    #[serde(default = "default_desired_interval")]
    pub desired_interval_millis: u64,

    #[serde(default = "default_min_distance")]
    pub min_distance_meters: f64,

    /// Count distance from fixes that share the previous fix's timestamp
    #[serde(default)]
    pub count_zero_interval_distance: bool,
}

fn default_accuracy_gate() -> f64 {
    20.0
}

fn default_desired_interval() -> u64 {
    1000
}

fn default_min_distance() -> f64 {
    5.0
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            accuracy_gate_meters: default_accuracy_gate(),
            desired_interval_millis: default_desired_interval(),
            min_distance_meters: default_min_distance(),
            count_zero_interval_distance: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key; falls back to `OPENWEATHER_API_KEY` when unset
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_cache_minutes")]
    pub cache_duration_minutes: u64,

    /// Distance moved that invalidates cached weather
    #[serde(default = "default_location_threshold")]
    pub location_threshold_meters: f64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Seed for the offline forecast generator
    #[serde(default)]
    pub synthetic_seed: Option<u64>,
}

fn default_base_url() -> String {
    velo_weather::DEFAULT_BASE_URL.to_string()
}

fn default_cache_minutes() -> u64 {
    velo_weather::DEFAULT_CACHE_MINUTES
}

fn default_location_threshold() -> f64 {
    velo_weather::DEFAULT_LOCATION_THRESHOLD_METERS
}

fn default_request_timeout() -> u64 {
    velo_weather::DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            cache_duration_minutes: default_cache_minutes(),
            location_threshold_meters: default_location_threshold(),
            request_timeout_secs: default_request_timeout(),
            synthetic_seed: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Created default config at {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Warnings are logged; errors fail the load.
    pub fn load_validated(path: &Path) -> Result<(Self, ValidationResult)> {
        let config = Self::load_from(path)?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let gate = self.tracking.accuracy_gate_meters;
        if !gate.is_finite() || gate <= 0.0 {
            result.add_error(
                "tracking.accuracy_gate_meters",
                "Accuracy gate must be a positive number of meters",
            );
        } else if gate > 100.0 {
            result.add_warning(
                "tracking.accuracy_gate_meters",
                "Accuracy gate above 100m will count very noisy fixes",
            );
        }

        if !self.tracking.min_distance_meters.is_finite() || self.tracking.min_distance_meters < 0.0 {
            result.add_error(
                "tracking.min_distance_meters",
                "Minimum distance cannot be negative",
            );
        }

        if self.tracking.desired_interval_millis == 0 {
            result.add_warning(
                "tracking.desired_interval_millis",
                "Zero interval lets the provider report as fast as it can",
            );
        }

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);

        if self.weather.cache_duration_minutes == 0 {
            result.add_warning(
                "weather.cache_duration_minutes",
                "Weather caching disabled (0 minutes)",
            );
        } else if self.weather.cache_duration_minutes > 1440 {
            result.add_warning(
                "weather.cache_duration_minutes",
                "Weather cache lifetime is more than 24 hours",
            );
        }

        let threshold = self.weather.location_threshold_meters;
        if !threshold.is_finite() || threshold <= 0.0 {
            result.add_error(
                "weather.location_threshold_meters",
                "Location threshold must be a positive number of meters",
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.weather.api_key.is_none() {
            result.add_warning(
                "weather.api_key",
                format!("No API key configured - set {} or weather will be synthetic", API_KEY_ENV),
            );
        }

        result
    }

    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    pub fn tracking_settings(&self) -> TrackingSettings {
        TrackingSettings {
            accuracy_gate_meters: self.tracking.accuracy_gate_meters,
            count_zero_interval_distance: self.tracking.count_zero_interval_distance,
            watch: WatchOptions {
                desired_interval_millis: self.tracking.desired_interval_millis,
                min_distance_meters: self.tracking.min_distance_meters,
            },
        }
    }

    pub fn weather_settings(&self) -> WeatherSettings {
        let api_key = self
            .weather
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty());

        WeatherSettings {
            base_url: self.weather.base_url.clone(),
            api_key,
            cache_duration: Duration::from_secs(self.weather.cache_duration_minutes * 60),
            location_threshold_km: self.weather.location_threshold_meters / 1000.0,
            request_timeout: Duration::from_secs(self.weather.request_timeout_secs),
            synthetic_seed: self.weather.synthetic_seed.unwrap_or_default(),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("velo");

        Ok(config_dir.join("config.toml"))
    }
}
