//! Synthetic weather used when no API key is configured or every fetch
//! path has failed.

use chrono::{DateTime, Duration, Utc};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::types::{ConditionTag, ForecastEntry, WeatherSnapshot};

pub const FORECAST_ENTRIES: usize = 8;
const FORECAST_STEP_HOURS: i64 = 3;

/// Fixed "partly cloudy" conditions.
pub fn synthetic_weather() -> WeatherSnapshot {
    WeatherSnapshot {
        temperature_c: 18,
        feels_like_c: 20,
        humidity_pct: 65,
        wind_speed_kmh: 12,
        wind_direction_deg: 180,
        description: "Partly cloudy".to_string(),
        icon: "02d".to_string(),
        condition: ConditionTag::Good,
        visibility_km: 10.0,
    }
}

/// Seeded generator for a plausible 24h forecast.
#[derive(Debug, Clone)]
pub struct SyntheticForecast {
    rng: ChaCha8Rng,
}

impl SyntheticForecast {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Eight entries, three hours apart, starting at `now`.
    pub fn generate(&mut self, now: DateTime<Utc>) -> Vec<ForecastEntry> {
        (0..FORECAST_ENTRIES as i64)
            .map(|i| ForecastEntry {
                time: now + Duration::hours(i * FORECAST_STEP_HOURS),
                temperature_c: self.rng.gen_range(16.0..=24.0_f64).round() as i32,
                condition: ConditionTag::Good,
                description: "Clear sky".to_string(),
                wind_speed_kmh: self.rng.gen_range(8.0..=18.0_f64).round() as i32,
                precipitation_pct: self.rng.gen_range(0.0..30.0),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_weather_is_deterministic() {
        assert_eq!(synthetic_weather(), synthetic_weather());
        assert_eq!(synthetic_weather().condition, ConditionTag::Good);
    }

    #[test]
    fn test_forecast_shape() {
        let now = Utc::now();
        let forecast = SyntheticForecast::new(7).generate(now);
        assert_eq!(forecast.len(), FORECAST_ENTRIES);
        assert_eq!(forecast[0].time, now);
        assert_eq!(forecast[7].time - forecast[0].time, Duration::hours(21));
        for entry in &forecast {
            assert!((16..=24).contains(&entry.temperature_c));
            assert!((8..=18).contains(&entry.wind_speed_kmh));
            assert!((0.0..30.0).contains(&entry.precipitation_pct));
        }
    }

    #[test]
    fn test_forecast_is_reproducible_per_seed() {
        let now = Utc::now();
        let a = SyntheticForecast::new(42).generate(now);
        let b = SyntheticForecast::new(42).generate(now);
        assert_eq!(a, b);
    }
}
