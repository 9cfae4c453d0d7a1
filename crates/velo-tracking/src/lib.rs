//! GPS ride tracking for Velo
//!
//! Consumes a stream of position fixes from a [`LocationProvider`] and
//! maintains cumulative distance, instantaneous and average speed, and the
//! ride's location history.

pub mod provider;
pub mod session;
pub mod types;

pub use provider::{LocationProvider, ReplayProvider};
pub use session::{FixOutcome, Observer, ObserverId, TrackingSession};
pub use types::*;
