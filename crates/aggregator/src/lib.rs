//! Aggregator: reduces a date's accounted cells to one [`Observation`].
//!
//! Absence of an observation is a normal outcome (cloud, no overpass, fully
//! masked) and is reported as `None`, never as an error.

pub mod observation;
pub mod stats;

pub use observation::{aggregate, Observation, SourceBreakdown, DEFAULT_MIN_COUNT};
pub use stats::{RunningStats, Summary};
