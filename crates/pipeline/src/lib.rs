//! Per-date albedo extraction driver.
//!
//! Wires a [`FrameSource`] to the quality mask, fusion, boundary accounting and
//! aggregation stages. Each date is processed independently; a run produces a
//! [`RunReport`] holding the ordered observation table and an outcome for every
//! date in the range.

pub mod config;
pub mod error;
pub mod report;
pub mod retry;
pub mod runner;
pub mod sources;

pub use config::{RetryConfig, RunConfig, SourceConfig};
pub use error::{PipelineError, PipelineResult, SourceError};
pub use report::{DateOutcome, DateStatus, RunReport, RunSummary};
pub use retry::{fetch_with_retry, FetchError, Fetched, RetryPolicy};
pub use runner::{Pipeline, DEFAULT_MAX_CONCURRENCY};
pub use sources::{DirectoryFrameSource, FrameSource, HttpFrameSource, StaticFrameSource};
