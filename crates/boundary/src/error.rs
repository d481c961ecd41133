//! Error types for boundary parsing and validation.

use thiserror::Error;

/// Errors raised while loading or validating a boundary polygon.
#[derive(Error, Debug)]
pub enum BoundaryError {
    /// No polygons, or a polygon without an exterior ring.
    #[error("boundary is empty")]
    Empty,

    /// A ring has fewer than 4 points once closed.
    #[error("ring {ring} has {points} points, need at least 4 (including closing point)")]
    TooFewPoints { ring: usize, points: usize },

    /// NaN or infinite coordinate.
    #[error("non-finite coordinate in ring {ring}")]
    NonFinite { ring: usize },

    /// A ring encloses no area.
    #[error("ring {ring} has zero area")]
    ZeroArea { ring: usize },

    /// Two non-adjacent edges of a ring cross.
    #[error("ring {ring} is self-intersecting (edges {first} and {second})")]
    SelfIntersecting {
        ring: usize,
        first: usize,
        second: usize,
    },

    /// Malformed WKT text.
    #[error("invalid WKT: {0}")]
    InvalidWkt(String),

    /// Unparseable coordinate value.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Malformed or non-polygonal GeoJSON.
    #[error("invalid GeoJSON: {0}")]
    InvalidGeoJson(String),

    /// Reading the boundary file failed.
    #[error("failed to read boundary file: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for boundary operations.
pub type BoundaryResult<T> = Result<T, BoundaryError>;
