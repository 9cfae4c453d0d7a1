//! Velo: ride tracking and cycling weather.
//!
//! The engine crates are re-exported so the binary and integration tests
//! only need this crate.

pub mod app;

pub use app::App;
pub use velo_core::{AppError, Config};
pub use velo_geo as geo;
pub use velo_tracking as tracking;
pub use velo_weather as weather;
