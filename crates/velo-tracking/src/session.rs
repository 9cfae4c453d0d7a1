//! Ride tracking session.
//!
//! One [`TrackingSession`] owns the state of the current (or last) ride. A
//! single fix stream feeds [`TrackingSession::ingest_fix`]; every accepted
//! fix recomputes distance and speed and is fanned out to observers in
//! arrival order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use velo_geo::{distance, Clock, Coordinate, SystemClock};

use crate::provider::LocationProvider;
use crate::types::{LocationFix, TrackingSettings, TrackingSnapshot};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Callback invoked with a fresh snapshot after each accepted fix.
pub type Observer = Arc<dyn Fn(&TrackingSnapshot) + Send + Sync>;

/// Handle returned by [`TrackingSession::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// What [`TrackingSession::ingest_fix`] did with a fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// First fix of the ride; stored without distance or speed.
    Seeded,
    /// Fix became the current position.
    Accepted { distance_counted: bool },
    /// Malformed fix; state untouched.
    Rejected,
    /// No ride in progress.
    Ignored,
}

#[derive(Debug, Default)]
struct TrackingState {
    is_tracking: bool,
    start_time_millis: Option<i64>,
    current_fix: Option<LocationFix>,
    previous_fix: Option<LocationFix>,
    total_distance_km: f64,
    current_speed_kmh: f64,
    location_history: Arc<Vec<LocationFix>>,
    final_duration_seconds: u64,
}

impl TrackingState {
    fn duration_seconds(&self, now_millis: i64) -> u64 {
        match (self.is_tracking, self.start_time_millis) {
            (true, Some(start)) => (now_millis.saturating_sub(start).max(0) / 1000) as u64,
            _ => self.final_duration_seconds,
        }
    }

    fn snapshot(&self, now_millis: i64) -> TrackingSnapshot {
        let duration_seconds = self.duration_seconds(now_millis);
        let average_speed_kmh = if duration_seconds > 0 {
            self.total_distance_km / (duration_seconds as f64 / 3600.0)
        } else {
            0.0
        };

        TrackingSnapshot {
            is_tracking: self.is_tracking,
            started_at_millis: self.start_time_millis,
            current_fix: self.current_fix,
            total_distance_km: self.total_distance_km,
            current_speed_kmh: self.current_speed_kmh,
            duration_seconds,
            location_history: Arc::clone(&self.location_history),
            average_speed_kmh,
        }
    }
}

pub struct TrackingSession {
    settings: TrackingSettings,
    clock: Arc<dyn Clock>,
    state: Mutex<TrackingState>,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer_id: AtomicU64,
    /// Serialises state updates with their notifications so observers see
    /// snapshots in fix order. Reentrant so an observer may call `stop`.
    ingest_lock: ReentrantMutex<()>,
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("settings", &self.settings)
            .field("state", &*self.state.lock())
            .field("observers", &self.observers.lock().len())
            .finish()
    }
}

impl Default for TrackingSession {
    fn default() -> Self {
        Self::new(TrackingSettings::default())
    }
}

impl TrackingSession {
    pub fn new(settings: TrackingSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: TrackingSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            clock,
            state: Mutex::new(TrackingState::default()),
            observers: Mutex::new(Vec::new()),
            next_observer_id: AtomicU64::new(1),
            ingest_lock: ReentrantMutex::new(()),
        }
    }

    pub fn settings(&self) -> &TrackingSettings {
        &self.settings
    }

    /// Start a ride using the provider for permission and the initial fix.
    ///
    /// Returns `false`, leaving the session untouched, when the location
    /// service is off, permission is refused, or no fix can be obtained.
    pub async fn start<P: LocationProvider>(&self, provider: &P) -> bool {
        if !provider.is_service_available().await {
            tracing::warn!("Cannot start tracking: location service unavailable");
            return false;
        }

        if !provider.request_permission().await {
            tracing::warn!("Cannot start tracking: location permission denied");
            return false;
        }

        match provider.current_fix().await {
            Ok(fix) => self.start_with_fix(fix),
            Err(e) => {
                tracing::warn!("Cannot start tracking: {}", e);
                false
            }
        }
    }

    /// Start a ride seeded with an already-acquired fix.
    pub fn start_with_fix(&self, initial: LocationFix) -> bool {
        if let Err(e) = initial.validate() {
            tracing::warn!("Cannot start tracking: {}", e);
            return false;
        }

        let _guard = self.ingest_lock.lock();
        let snapshot = {
            let mut state = self.state.lock();
            let now = self.clock.now_millis();
            *state = TrackingState {
                is_tracking: true,
                start_time_millis: Some(now),
                current_fix: Some(initial),
                previous_fix: None,
                total_distance_km: 0.0,
                current_speed_kmh: 0.0,
                location_history: Arc::new(vec![initial]),
                final_duration_seconds: 0,
            };
            state.snapshot(now)
        };

        tracing::info!(
            "Tracking started at {:.5}, {:.5} (accuracy {:.0}m)",
            initial.coordinate.latitude,
            initial.coordinate.longitude,
            initial.accuracy_meters
        );
        self.notify(&snapshot);
        true
    }

    /// Apply one fix from the provider stream.
    pub fn ingest_fix(&self, fix: LocationFix) -> FixOutcome {
        if let Err(e) = fix.validate() {
            tracing::warn!("Dropping fix: {}", e);
            return FixOutcome::Rejected;
        }

        let _guard = self.ingest_lock.lock();
        let (outcome, snapshot) = {
            let mut state = self.state.lock();
            if !state.is_tracking {
                tracing::debug!("Ignoring fix at {}: not tracking", fix.timestamp_millis);
                return FixOutcome::Ignored;
            }

            let Some(current) = state.current_fix else {
                state.current_fix = Some(fix);
                Arc::make_mut(&mut state.location_history).push(fix);
                return FixOutcome::Seeded;
            };

            let leg_km = distance(&current.coordinate, &fix.coordinate);
            let elapsed_millis = fix.timestamp_millis - current.timestamp_millis;

            let accurate = fix.accuracy_meters < self.settings.accuracy_gate_meters;
            let distance_counted =
                accurate && (elapsed_millis > 0 || self.settings.count_zero_interval_distance);
            if distance_counted {
                state.total_distance_km += leg_km;
            } else {
                tracing::debug!(
                    "Discarding {:.4} km leg (accuracy {:.0}m, interval {}ms)",
                    leg_km,
                    fix.accuracy_meters,
                    elapsed_millis
                );
            }

            if elapsed_millis > 0 {
                state.current_speed_kmh = leg_km / (elapsed_millis as f64 / MILLIS_PER_HOUR);
            }

            state.previous_fix = Some(current);
            state.current_fix = Some(fix);
            Arc::make_mut(&mut state.location_history).push(fix);

            (
                FixOutcome::Accepted { distance_counted },
                state.snapshot(self.clock.now_millis()),
            )
        };

        self.notify(&snapshot);
        outcome
    }

    /// Finish the ride and return its final snapshot.
    ///
    /// Safe to call at any time; on a session that never started this
    /// returns a zeroed snapshot. Totals stay readable until the next
    /// start.
    pub fn stop(&self) -> TrackingSnapshot {
        let _guard = self.ingest_lock.lock();
        let snapshot = {
            let mut state = self.state.lock();
            let now = self.clock.now_millis();
            if state.is_tracking {
                state.final_duration_seconds = state.duration_seconds(now);
                state.is_tracking = false;
                tracing::info!(
                    "Tracking stopped: {:.3} km in {}s",
                    state.total_distance_km,
                    state.final_duration_seconds
                );
            }
            state.snapshot(now)
        };
        self.observers.lock().clear();
        snapshot
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        self.state.lock().snapshot(self.clock.now_millis())
    }

    pub fn is_tracking(&self) -> bool {
        self.state.lock().is_tracking
    }

    /// Last known position, if any fix has been recorded.
    pub fn current_position(&self) -> Option<Coordinate> {
        self.state.lock().current_fix.map(|fix| fix.coordinate)
    }

    /// The fix that was current before the latest accepted one.
    pub fn previous_fix(&self) -> Option<LocationFix> {
        self.state.lock().previous_fix
    }

    /// Register a callback for ride updates.
    ///
    /// Observers run synchronously on the ingest path. They may read the
    /// session or end the ride with `stop`; other observers still receive
    /// the snapshot being delivered.
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&TrackingSnapshot) + Send + Sync + 'static,
    {
        let id = ObserverId(self.next_observer_id.fetch_add(1, Ordering::Relaxed));
        self.observers.lock().push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.lock().len()
    }

    /// Feed fixes from a watch stream until it ends, `cancel` fires, or the
    /// ride is stopped. Returns the number of fixes the session applied.
    pub async fn follow(
        &self,
        mut fixes: mpsc::Receiver<LocationFix>,
        cancel: CancellationToken,
    ) -> usize {
        let mut applied = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!("Fix follower cancelled after {} fixes", applied);
                    break;
                }
                next = fixes.recv() => {
                    let Some(fix) = next else {
                        tracing::debug!("Fix stream ended after {} fixes", applied);
                        break;
                    };
                    match self.ingest_fix(fix) {
                        FixOutcome::Ignored => break,
                        FixOutcome::Rejected => {}
                        FixOutcome::Seeded | FixOutcome::Accepted { .. } => applied += 1,
                    }
                }
            }
        }
        applied
    }

    fn notify(&self, snapshot: &TrackingSnapshot) {
        let observers: Vec<Observer> = self
            .observers
            .lock()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(snapshot);
        }
    }
}
