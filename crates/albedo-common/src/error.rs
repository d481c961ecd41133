//! Error types shared by the albedo pipeline crates.

use thiserror::Error;

/// Result type alias using AlbedoError.
pub type AlbedoResult<T> = Result<T, AlbedoError>;

/// Primary error type for shared data model operations.
#[derive(Debug, Error)]
pub enum AlbedoError {
    // === Data Model Errors ===
    #[error("Grid '{band}' has {actual} cells, expected {expected}")]
    ShapeMismatch {
        band: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid grid specification: {0}")]
    InvalidGrid(String),

    #[error("Unknown sensor: {0}")]
    UnknownSensor(String),

    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    // === Parsing Errors ===
    #[error("Invalid date specification: {0}")]
    InvalidDate(String),

    #[error("Invalid BBOX: {0}")]
    InvalidBbox(String),

    #[error("Failed to decode frame: {0}")]
    FrameDecode(String),
}

impl AlbedoError {
    /// Create a ShapeMismatch error for a named band.
    pub fn shape_mismatch(band: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            band: band.into(),
            expected,
            actual,
        }
    }
}

impl From<serde_json::Error> for AlbedoError {
    fn from(err: serde_json::Error) -> Self {
        AlbedoError::FrameDecode(format!("JSON error: {}", err))
    }
}
