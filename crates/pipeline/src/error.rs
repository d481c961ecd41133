//! Error types for frame sources and run setup.

use boundary::BoundaryError;
use quality_mask::QualityError;
use thiserror::Error;

/// Failure to fetch frames for one date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// No frame exists for the date. Not an error for the run.
    #[error("no data for date")]
    NoData,

    /// Network, quota or service failure; worth retrying.
    #[error("transient source error: {0}")]
    Transient(String),

    /// The source answered with something unusable; retrying will not help.
    #[error("invalid source response: {0}")]
    Invalid(String),
}

impl SourceError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Transient(_))
    }
}

/// Errors that stop a run before any date is processed.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid run configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The boundary polygon could not be loaded or is malformed.
    #[error("boundary error: {0}")]
    Boundary(#[from] BoundaryError),

    /// Quality tier could not be resolved.
    #[error("quality tier error: {0}")]
    Quality(#[from] QualityError),

    /// The frame source could not be built.
    #[error("source setup error: {0}")]
    SourceSetup(String),
}

/// Result type for run setup.
pub type PipelineResult<T> = Result<T, PipelineError>;
