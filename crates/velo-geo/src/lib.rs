//! Geodesic math and ride metrics for Velo
//!
//! Pure functions shared by the tracking and weather engines: great-circle
//! distance, path length, display formatting, and the clock abstraction
//! both engines read "now" from.

pub mod clock;
pub mod coordinate;
pub mod error;
pub mod haversine;
pub mod metrics;

pub use clock::{Clock, ManualClock, SystemClock};
pub use coordinate::Coordinate;
pub use error::GeoError;
pub use haversine::{distance, distance_meters, format_distance, path_distance, EARTH_RADIUS_KM};
pub use metrics::{estimate_calories, format_duration, format_speed, SpeedBand};
