//! OpenWeatherMap client.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;
use velo_geo::Coordinate;

use crate::synthetic::FORECAST_ENTRIES;
use crate::types::{ConditionTag, ForecastEntry, WeatherError, WeatherSettings, WeatherSnapshot};

const MS_TO_KMH: f64 = 3.6;
const DEFAULT_VISIBILITY_METERS: f64 = 10_000.0;

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    main: MainBlock,
    wind: WindBlock,
    weather: Vec<ConditionBlock>,
    visibility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastItem>,
}

#[derive(Debug, Deserialize)]
struct ForecastItem {
    dt: i64,
    main: MainBlock,
    wind: WindBlock,
    weather: Vec<ConditionBlock>,
    #[serde(default)]
    pop: f64,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct WindBlock {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionBlock {
    id: i32,
    description: String,
    #[serde(default)]
    icon: String,
}

/// Round half up, matching how the display layer rounds readings.
fn round_reading(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

fn primary_condition(blocks: Vec<ConditionBlock>) -> Result<ConditionBlock, WeatherError> {
    blocks
        .into_iter()
        .next()
        .ok_or_else(|| WeatherError::Parse("response has no weather conditions".to_string()))
}

impl CurrentResponse {
    fn into_snapshot(self) -> Result<WeatherSnapshot, WeatherError> {
        let condition = primary_condition(self.weather)?;
        let temperature = self.main.temp;
        Ok(WeatherSnapshot {
            temperature_c: round_reading(temperature),
            feels_like_c: round_reading(self.main.feels_like.unwrap_or(temperature)),
            humidity_pct: round_reading(self.main.humidity),
            wind_speed_kmh: round_reading(self.wind.speed * MS_TO_KMH),
            wind_direction_deg: round_reading(self.wind.deg),
            condition: ConditionTag::classify(condition.id, temperature),
            description: condition.description,
            icon: condition.icon,
            visibility_km: self.visibility.unwrap_or(DEFAULT_VISIBILITY_METERS) / 1000.0,
        })
    }
}

impl ForecastItem {
    fn into_entry(self) -> Result<ForecastEntry, WeatherError> {
        let condition = primary_condition(self.weather)?;
        let time = DateTime::<Utc>::from_timestamp(self.dt, 0)
            .ok_or_else(|| WeatherError::Parse(format!("invalid forecast timestamp {}", self.dt)))?;
        Ok(ForecastEntry {
            time,
            temperature_c: round_reading(self.main.temp),
            condition: ConditionTag::classify(condition.id, self.main.temp),
            description: condition.description,
            wind_speed_kmh: round_reading(self.wind.speed * MS_TO_KMH),
            precipitation_pct: self.pop * 100.0,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(settings: &WeatherSettings) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(settings.request_timeout).build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone().filter(|key| !key.trim().is_empty()),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current conditions at `position`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_current(&self, position: &Coordinate) -> Result<WeatherSnapshot, WeatherError> {
        let response: CurrentResponse = self.get_json("weather", position).await?;
        response.into_snapshot()
    }

    /// Next 24 hours in three-hour steps.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_forecast(&self, position: &Coordinate) -> Result<Vec<ForecastEntry>, WeatherError> {
        let response: ForecastResponse = self.get_json("forecast", position).await?;
        response
            .list
            .into_iter()
            .take(FORECAST_ENTRIES)
            .map(ForecastItem::into_entry)
            .collect()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        position: &Coordinate,
    ) -> Result<T, WeatherError> {
        let api_key = self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)?;
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", position.latitude.to_string()),
                ("lon", position.longitude.to_string()),
                ("appid", api_key.to_string()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::debug!("Weather API {} returned {}", endpoint, status);
            return Err(WeatherError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await.map_err(map_request_error)?;
        serde_json::from_str(&body).map_err(|e| WeatherError::Parse(e.to_string()))
    }
}

fn map_request_error(error: reqwest::Error) -> WeatherError {
    if error.is_timeout() {
        WeatherError::Timeout
    } else {
        WeatherError::Network(error)
    }
}
