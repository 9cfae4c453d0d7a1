//! Location provider seam.
//!
//! The platform location service is external; the session only needs the
//! four operations below. [`ReplayProvider`] plays back a recorded list of
//! fixes and stands in for the platform service in demos and tests.

use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::types::{LocationError, LocationFix, WatchOptions};

const WATCH_CHANNEL_CAPACITY: usize = 64;

pub trait LocationProvider: Send + Sync {
    fn request_permission(&self) -> impl Future<Output = bool> + Send;

    fn is_service_available(&self) -> impl Future<Output = bool> + Send;

    /// One-shot position request.
    fn current_fix(&self) -> impl Future<Output = Result<LocationFix, LocationError>> + Send;

    /// Subscribe to continuous updates. The stream ends when the receiver
    /// is dropped or the provider has nothing more to deliver.
    fn watch(
        &self,
        options: WatchOptions,
    ) -> impl Future<Output = Result<mpsc::Receiver<LocationFix>, LocationError>> + Send;
}

/// Replays a fixed sequence of fixes.
///
/// The first fix answers [`LocationProvider::current_fix`]; the rest are
/// delivered by [`LocationProvider::watch`], `interval` apart.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    fixes: Vec<LocationFix>,
    permission_granted: bool,
    service_available: bool,
    interval: Duration,
}

impl ReplayProvider {
    pub fn new(fixes: Vec<LocationFix>) -> Self {
        Self {
            fixes,
            permission_granted: true,
            service_available: true,
            interval: Duration::ZERO,
        }
    }

    pub fn with_permission(mut self, granted: bool) -> Self {
        self.permission_granted = granted;
        self
    }

    pub fn with_service_available(mut self, available: bool) -> Self {
        self.service_available = available;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl LocationProvider for ReplayProvider {
    async fn request_permission(&self) -> bool {
        self.permission_granted
    }

    async fn is_service_available(&self) -> bool {
        self.service_available
    }

    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        if !self.service_available {
            return Err(LocationError::ServiceUnavailable);
        }
        if !self.permission_granted {
            return Err(LocationError::PermissionDenied);
        }
        self.fixes.first().copied().ok_or(LocationError::NoFix)
    }

    async fn watch(
        &self,
        options: WatchOptions,
    ) -> Result<mpsc::Receiver<LocationFix>, LocationError> {
        if !self.service_available {
            return Err(LocationError::ServiceUnavailable);
        }
        if !self.permission_granted {
            return Err(LocationError::PermissionDenied);
        }

        tracing::debug!(
            "Replaying {} fixes (hint: every {}ms / {}m)",
            self.fixes.len().saturating_sub(1),
            options.desired_interval_millis,
            options.min_distance_meters
        );

        let (tx, rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);
        let fixes: Vec<LocationFix> = self.fixes.iter().skip(1).copied().collect();
        let interval = self.interval;

        tokio::spawn(async move {
            for fix in fixes {
                if !interval.is_zero() {
                    tokio::time::sleep(interval).await;
                }
                if tx.send(fix).await.is_err() {
                    tracing::debug!("Watch receiver dropped, ending replay");
                    return;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixes() -> Vec<LocationFix> {
        vec![
            LocationFix::new(45.0, 7.0, 0, 5.0),
            LocationFix::new(45.001, 7.0, 1_000, 5.0),
            LocationFix::new(45.002, 7.0, 2_000, 5.0),
        ]
    }

    #[tokio::test]
    async fn test_current_fix_is_first() {
        let provider = ReplayProvider::new(fixes());
        let fix = provider.current_fix().await.unwrap();
        assert_eq!(fix.timestamp_millis, 0);
    }

    #[tokio::test]
    async fn test_empty_replay_has_no_fix() {
        let provider = ReplayProvider::new(Vec::new());
        assert_eq!(provider.current_fix().await, Err(LocationError::NoFix));
    }

    #[tokio::test]
    async fn test_denied_permission() {
        let provider = ReplayProvider::new(fixes()).with_permission(false);
        assert!(!provider.request_permission().await);
        assert_eq!(provider.current_fix().await, Err(LocationError::PermissionDenied));
        assert!(provider.watch(WatchOptions::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_watch_streams_remaining_fixes() {
        let provider = ReplayProvider::new(fixes());
        let mut rx = provider.watch(WatchOptions::default()).await.unwrap();
        let mut seen = Vec::new();
        while let Some(fix) = rx.recv().await {
            seen.push(fix.timestamp_millis);
        }
        assert_eq!(seen, vec![1_000, 2_000]);
    }
}
