//! Error types for fusion.

use albedo_common::{GridSpec, Sensor};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that make two frames impossible to fuse.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// Neither sensor produced a frame.
    #[error("no frames to fuse")]
    NoFrames,

    /// The frames are on different grids, so cells cannot be paired.
    #[error("grid mismatch between terra {terra:?} and aqua {aqua:?}")]
    GridMismatch { terra: GridSpec, aqua: GridSpec },

    /// The frames belong to different days.
    #[error("date mismatch: terra {terra}, aqua {aqua}")]
    DateMismatch { terra: NaiveDate, aqua: NaiveDate },

    /// A frame was passed in the slot of the other sensor.
    #[error("expected a {expected} frame, got {actual}")]
    WrongSensor { expected: Sensor, actual: Sensor },
}

/// Result type for fusion.
pub type FusionResult<T> = Result<T, FusionError>;
