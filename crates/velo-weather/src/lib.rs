//! Weather service for Velo
//!
//! Fetches current conditions and forecasts from OpenWeatherMap behind a
//! battery-friendly single-slot cache, and turns raw conditions into
//! cyclist-oriented tags and ride recommendations.

pub mod cache;
pub mod provider;
pub mod recommend;
pub mod synthetic;
pub mod types;

pub use cache::WeatherCache;
pub use provider::OpenWeatherClient;
pub use recommend::recommend;
pub use synthetic::{synthetic_weather, SyntheticForecast};
pub use types::*;
