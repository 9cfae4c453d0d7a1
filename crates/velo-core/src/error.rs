//! Top-level error types for the Velo application.
//!
//! Engine crates keep their own error enums; this module gathers them so
//! the composition root can log the detail and show a short message.

use thiserror::Error;
use velo_tracking::LocationError;
use velo_weather::WeatherError;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Location(e) => location_message(e),
            AppError::Weather(e) => weather_message(e),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

fn location_message(error: &LocationError) -> &'static str {
    match error {
        LocationError::PermissionDenied => "GPS permission required. Enable location access to ride.",
        LocationError::ServiceUnavailable => "Location services are off. Turn on GPS to ride.",
        LocationError::Timeout => "Waiting for GPS took too long. Try again outdoors.",
        LocationError::NoFix => "No GPS signal yet. Try again in a moment.",
        LocationError::InvalidFix(_) => "Received an unusable GPS reading.",
    }
}

fn weather_message(error: &WeatherError) -> &'static str {
    match error {
        WeatherError::Network(_) => "Unable to reach the weather service. Check your connection.",
        WeatherError::Timeout => "The weather request timed out. Please try again.",
        WeatherError::Status { status, .. } if *status == 401 => {
            "Weather API key is invalid. Check settings."
        }
        WeatherError::Status { status, .. } if *status >= 500 => {
            "The weather service is experiencing issues. Please try again later."
        }
        WeatherError::Status { .. } => "Weather request failed. Please try again.",
        WeatherError::Parse(_) => "Received unexpected weather data.",
        WeatherError::MissingApiKey => "No weather API key configured. Showing sample weather.",
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
