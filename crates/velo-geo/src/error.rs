//! Error types for the geo crate.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}
