//! Bounded exponential backoff around a [`FrameSource`] fetch.

use std::time::Duration;

use albedo_common::{BoundingBox, Frame};
use chrono::NaiveDate;
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SourceError;
use crate::sources::FrameSource;

/// Retry schedule for transient source failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt (doubles each retry).
    pub initial_delay: Duration,
    /// Upper bound on a single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let mut delay = self.initial_delay;
        for _ in 1..attempt {
            delay = std::cmp::min(delay * 2, self.max_delay);
        }
        std::cmp::min(delay, self.max_delay)
    }
}

/// Frames from a successful fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub frames: Vec<Frame>,
    /// Attempts used, including the successful one.
    pub attempts: u32,
}

/// Why a date's fetch produced no frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("no data")]
    NoData,

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { last: String, attempts: u32 },

    #[error("invalid response after {attempts} attempts: {reason}")]
    Invalid { reason: String, attempts: u32 },

    #[error("cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },
}

impl FetchError {
    pub fn attempts(&self) -> u32 {
        match self {
            FetchError::NoData => 0,
            FetchError::Exhausted { attempts, .. }
            | FetchError::Invalid { attempts, .. }
            | FetchError::Cancelled { attempts } => *attempts,
        }
    }
}

/// Fetch frames, retrying transient failures with capped doubling delays.
///
/// `NoData` and invalid responses are returned without retrying. The token is
/// checked before each attempt and interrupts any pending delay.
pub async fn fetch_with_retry(
    source: &dyn FrameSource,
    date: NaiveDate,
    region: &BoundingBox,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Fetched, FetchError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { attempts: attempt });
        }
        attempt += 1;

        match source.get_frames(date, region).await {
            Ok(frames) if frames.is_empty() => return Err(FetchError::NoData),
            Ok(frames) => {
                debug!(date = %date, attempt, frames = frames.len(), "Fetched frames");
                return Ok(Fetched {
                    frames,
                    attempts: attempt,
                });
            }
            Err(SourceError::NoData) => return Err(FetchError::NoData),
            Err(SourceError::Invalid(reason)) => {
                return Err(FetchError::Invalid {
                    reason,
                    attempts: attempt,
                })
            }
            Err(SourceError::Transient(e)) => {
                if attempt >= max_attempts {
                    return Err(FetchError::Exhausted {
                        last: e,
                        attempts: attempt,
                    });
                }

                let delay = policy.delay_for(attempt);
                warn!(
                    source = source.name(),
                    date = %date,
                    error = %e,
                    retry = attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Frame fetch failed, retrying"
                );
                counter!("albedo_fetch_retries_total", "source" => source.name().to_string())
                    .increment(1);

                tokio::select! {
                    _ = cancel.cancelled() => {
                        return Err(FetchError::Cancelled { attempts: attempt });
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
}
