use anyhow::Result;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use velo_core::{AppError, Config};
use velo_geo::{Clock, SystemClock};
use velo_tracking::{LocationProvider, TrackingSession, TrackingSnapshot};
use velo_weather::{recommend, ForecastEntry, RideRecommendation, WeatherCache, WeatherSnapshot};

/// Background task draining the provider's fix stream into the session
struct Follower {
    cancel: CancellationToken,
    handle: JoinHandle<usize>,
}

/// Main application state: one ride session and one weather cache
pub struct App {
    config: Config,
    session: Arc<TrackingSession>,
    weather: Arc<WeatherCache>,
    follower: Option<Follower>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create an application whose session and cache read time from `clock`
    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        let session = TrackingSession::with_clock(config.tracking_settings(), Arc::clone(&clock));
        let weather = WeatherCache::with_clock(&config.weather_settings(), clock)?;

        tracing::info!("Application created");

        Ok(Self {
            config,
            session: Arc::new(session),
            weather: Arc::new(weather),
            follower: None,
        })
    }

    /// Start a ride and begin following the provider's fix stream.
    ///
    /// `Ok(false)` means the session refused to start (service off, no
    /// permission, or no initial fix).
    pub async fn start_ride<P: LocationProvider>(&mut self, provider: &P) -> Result<bool, AppError> {
        if self.follower.is_some() || self.session.is_tracking() {
            tracing::warn!("Ride already in progress");
            return Ok(false);
        }

        if !self.session.start(provider).await {
            return Ok(false);
        }

        let fixes = match provider.watch(self.session.settings().watch).await {
            Ok(rx) => rx,
            Err(e) => {
                tracing::warn!("Failed to watch location updates: {}", e);
                self.session.stop();
                return Err(e.into());
            }
        };

        let cancel = CancellationToken::new();
        let session = Arc::clone(&self.session);
        let token = cancel.clone();
        let handle = tokio::spawn(async move { session.follow(fixes, token).await });

        self.follower = Some(Follower { cancel, handle });
        tracing::info!("Ride started");
        Ok(true)
    }

    /// Wait for the fix stream to end on its own.
    ///
    /// Returns the number of fixes applied after the initial one.
    pub async fn wait_for_ride(&mut self) -> usize {
        match self.follower.take() {
            Some(follower) => join_follower(follower.handle).await,
            None => 0,
        }
    }

    /// Stop following fixes, end the ride and return its final snapshot
    pub async fn stop_ride(&mut self) -> TrackingSnapshot {
        if let Some(follower) = self.follower.take() {
            follower.cancel.cancel();
            let delivered = join_follower(follower.handle).await;
            tracing::debug!("Follower applied {} fixes", delivered);
        }
        self.session.stop()
    }

    /// Weather at the rider's last known position
    pub async fn current_weather(&self) -> WeatherSnapshot {
        self.weather.weather_for_session(&self.session).await
    }

    pub async fn recommendation(&self) -> RideRecommendation {
        recommend(&self.current_weather().await)
    }

    /// Forecast at the last known position; empty until a fix exists
    pub async fn forecast(&self) -> Vec<ForecastEntry> {
        match self.session.current_position() {
            Some(position) => self.weather.forecast(&position).await,
            None => Vec::new(),
        }
    }

    pub fn session(&self) -> &Arc<TrackingSession> {
        &self.session
    }

    pub fn weather(&self) -> &Arc<WeatherCache> {
        &self.weather
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }
}

async fn join_follower(handle: JoinHandle<usize>) -> usize {
    match handle.await {
        Ok(delivered) => delivered,
        Err(e) => {
            tracing::warn!("Fix follower task failed: {}", e);
            0
        }
    }
}
