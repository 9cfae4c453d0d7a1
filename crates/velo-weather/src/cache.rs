//! Single-slot weather cache gated on age and distance moved.
//!
//! A new request goes out only when the slot is empty, has expired, or the
//! rider has moved more than the configured threshold from where the cached
//! result was fetched. Fetch failures degrade to the cached entry (even if
//! stale) and then to synthetic data; [`WeatherCache::get`] never fails.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use velo_geo::{distance, Clock, Coordinate, SystemClock};
use velo_tracking::TrackingSession;

use crate::provider::OpenWeatherClient;
use crate::synthetic::{synthetic_weather, SyntheticForecast};
use crate::types::{
    CacheStatus, ForecastEntry, WeatherCacheEntry, WeatherError, WeatherSettings, WeatherSnapshot,
};

pub struct WeatherCache {
    client: OpenWeatherClient,
    cache_duration_millis: i64,
    location_threshold_km: f64,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<WeatherCacheEntry>>,
    /// Held across outbound current-weather requests so concurrent misses
    /// share one fetch.
    fetch_lock: tokio::sync::Mutex<()>,
    synthetic_forecast: Mutex<SyntheticForecast>,
}

impl std::fmt::Debug for WeatherCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherCache")
            .field("cache_duration_millis", &self.cache_duration_millis)
            .field("location_threshold_km", &self.location_threshold_km)
            .field("slot", &*self.slot.lock())
            .finish()
    }
}

impl WeatherCache {
    pub fn new(settings: &WeatherSettings) -> Result<Self, WeatherError> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &WeatherSettings, clock: Arc<dyn Clock>) -> Result<Self, WeatherError> {
        Ok(Self {
            client: OpenWeatherClient::new(settings)?,
            cache_duration_millis: i64::try_from(settings.cache_duration.as_millis()).unwrap_or(i64::MAX),
            location_threshold_km: settings.location_threshold_km,
            clock,
            slot: Mutex::new(None),
            fetch_lock: tokio::sync::Mutex::new(()),
            synthetic_forecast: Mutex::new(SyntheticForecast::new(settings.synthetic_seed)),
        })
    }

    /// Whether `get(position)` would go to the network.
    pub fn should_fetch(&self, position: &Coordinate) -> bool {
        self.usable_for(position).is_none()
    }

    /// Current weather at `position`, from cache when the policy allows.
    pub async fn get(&self, position: &Coordinate) -> WeatherSnapshot {
        if let Some(cached) = self.usable_for(position) {
            tracing::debug!("Using cached weather data");
            return cached;
        }

        let _fetch = self.fetch_lock.lock().await;

        // Another caller may have refreshed the slot while we waited.
        if let Some(cached) = self.usable_for(position) {
            tracing::debug!("Using weather fetched by a concurrent request");
            return cached;
        }

        if !self.client.has_api_key() {
            tracing::info!("No weather API key configured, using synthetic weather");
            let data = synthetic_weather();
            self.store(data.clone(), *position);
            return data;
        }

        tracing::info!("Fetching fresh weather data");
        match self.client.fetch_current(position).await {
            Ok(data) => {
                self.store(data.clone(), *position);
                data
            }
            Err(e) => {
                if let Some(entry) = self.slot.lock().as_ref() {
                    tracing::warn!("Weather fetch failed ({}), using cached data", e);
                    return entry.data.clone();
                }
                tracing::warn!("Weather fetch failed ({}), using synthetic data", e);
                synthetic_weather()
            }
        }
    }

    /// Weather at the session's last known position, or synthetic data if
    /// no fix has been recorded yet.
    pub async fn weather_for_session(&self, session: &TrackingSession) -> WeatherSnapshot {
        match session.current_position() {
            Some(position) => self.get(&position).await,
            None => {
                tracing::info!("No GPS position available, using synthetic weather");
                synthetic_weather()
            }
        }
    }

    /// Fetch regardless of the cache policy and store the result.
    pub async fn force_refresh(&self, position: &Coordinate) -> Result<WeatherSnapshot, WeatherError> {
        let _fetch = self.fetch_lock.lock().await;
        tracing::info!("Force refreshing weather data");
        let data = self.client.fetch_current(position).await?;
        self.store(data.clone(), *position);
        Ok(data)
    }

    /// 24h forecast; falls back to a seeded synthetic forecast.
    pub async fn forecast(&self, position: &Coordinate) -> Vec<ForecastEntry> {
        if self.client.has_api_key() {
            match self.client.fetch_forecast(position).await {
                Ok(entries) => return entries,
                Err(e) => tracing::warn!("Forecast fetch failed ({}), using synthetic forecast", e),
            }
        }
        let now = DateTime::<Utc>::from_timestamp_millis(self.clock.now_millis()).unwrap_or_else(Utc::now);
        self.synthetic_forecast.lock().generate(now)
    }

    /// Cached weather while it is still within its lifetime.
    pub fn cached(&self) -> Option<WeatherSnapshot> {
        let now = self.clock.now_millis();
        self.slot
            .lock()
            .as_ref()
            .filter(|entry| now <= entry.expires_at_millis)
            .map(|entry| entry.data.clone())
    }

    pub fn entry(&self) -> Option<WeatherCacheEntry> {
        self.slot.lock().clone()
    }

    pub fn cache_status(&self) -> CacheStatus {
        let now = self.clock.now_millis();
        let slot = self.slot.lock();
        match slot.as_ref() {
            Some(entry) => CacheStatus {
                has_data: true,
                is_expired: now > entry.expires_at_millis,
                age_millis: Some(now - entry.fetched_at_millis),
                expires_in_millis: Some(entry.expires_at_millis - now),
                location: Some(entry.location),
            },
            None => CacheStatus {
                has_data: false,
                is_expired: true,
                age_millis: None,
                expires_in_millis: None,
                location: None,
            },
        }
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }

    fn usable_for(&self, position: &Coordinate) -> Option<WeatherSnapshot> {
        let now = self.clock.now_millis();
        let slot = self.slot.lock();
        let entry = slot.as_ref()?;

        if now > entry.expires_at_millis {
            tracing::debug!("Weather cache expired");
            return None;
        }

        let moved_km = distance(&entry.location, position);
        if moved_km > self.location_threshold_km {
            tracing::debug!("Moved {:.2} km since last weather fetch", moved_km);
            return None;
        }

        Some(entry.data.clone())
    }

    fn store(&self, data: WeatherSnapshot, location: Coordinate) {
        let now = self.clock.now_millis();
        *self.slot.lock() = Some(WeatherCacheEntry {
            data,
            location,
            fetched_at_millis: now,
            expires_at_millis: now.saturating_add(self.cache_duration_millis),
        });
    }
}
