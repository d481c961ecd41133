//! Per-date driver: fetch, fuse, account, aggregate.
//!
//! Dates are independent. A run fans out over the range with bounded
//! concurrency and reassembles results by date, so completion order never
//! shows in the output.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use aggregator::aggregate;
use albedo_common::{BoundingBox, DateRange, Frame};
use boundary::{account, BoundaryPolygon, MinOverlap};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use fusion::{fuse_frames, FusionError};
use metrics::counter;
use quality_mask::QualityTier;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::error::PipelineResult;
use crate::report::{DateOutcome, RunReport};
use crate::retry::{fetch_with_retry, FetchError, RetryPolicy};
use crate::sources::FrameSource;

/// Default number of dates processed at once.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// A configured extraction over one boundary and quality tier.
#[derive(Clone)]
pub struct Pipeline {
    source: Arc<dyn FrameSource>,
    boundary: Arc<BoundaryPolygon>,
    region: BoundingBox,
    tier: QualityTier,
    min_overlap: MinOverlap,
    min_count: usize,
    max_concurrency: usize,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(source: Arc<dyn FrameSource>, boundary: BoundaryPolygon, tier: QualityTier) -> Self {
        let region = boundary.bbox();
        Self {
            source,
            boundary: Arc::new(boundary),
            region,
            tier,
            min_overlap: MinOverlap::default(),
            min_count: aggregator::DEFAULT_MIN_COUNT,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            retry: RetryPolicy::default(),
        }
    }

    /// Validate the config, load the boundary and build the source.
    pub fn from_config(config: &RunConfig) -> PipelineResult<Self> {
        config.validate()?;
        let tier = config.resolve_tier()?;
        let boundary = BoundaryPolygon::load(&config.boundary)?;
        let source = config.build_source()?;

        Ok(Self::new(source, boundary, tier)
            .with_min_overlap(config.min_overlap())
            .with_min_count(config.min_count)
            .with_max_concurrency(config.max_concurrency)
            .with_retry(config.retry_policy()))
    }

    pub fn with_min_overlap(mut self, min_overlap: MinOverlap) -> Self {
        self.min_overlap = min_overlap;
        self
    }

    pub fn with_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn tier(&self) -> &QualityTier {
        &self.tier
    }

    pub fn boundary(&self) -> &BoundaryPolygon {
        &self.boundary
    }

    /// Process every date in `dates` and collect a report.
    ///
    /// Per-date failures never abort the run; each date gets an outcome. Once
    /// `cancel` fires, pending dates are reported as failed with reason
    /// `"cancelled"`.
    #[instrument(skip(self, cancel), fields(start = %dates.start, end = %dates.end))]
    pub async fn run(&self, dates: &DateRange, cancel: &CancellationToken) -> RunReport {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        info!(
            run_id = %run_id,
            days = dates.len(),
            tier = %self.tier,
            source = self.source.name(),
            max_concurrency = self.max_concurrency,
            "Starting extraction run"
        );

        let outcomes: BTreeMap<NaiveDate, DateOutcome> = stream::iter(dates.days())
            .map(|date| async move { (date, self.process_date(date, cancel).await) })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let report = RunReport::from_outcomes(run_id, self.tier.name(), outcomes);
        info!(
            run_id = %run_id,
            ok = report.summary.ok,
            no_data = report.summary.no_data,
            degenerate = report.summary.degenerate,
            failed = report.summary.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction run complete"
        );
        report
    }

    /// Fetch and reduce one date.
    #[instrument(skip(self, cancel), fields(source = self.source.name()))]
    pub async fn process_date(&self, date: NaiveDate, cancel: &CancellationToken) -> DateOutcome {
        let outcome =
            match fetch_with_retry(self.source.as_ref(), date, &self.region, &self.retry, cancel)
                .await
            {
                Ok(fetched) => self.reduce(date, &fetched.frames, fetched.attempts),
                Err(FetchError::NoData) => DateOutcome::NoData,
                Err(FetchError::Cancelled { attempts }) => DateOutcome::Failed {
                    reason: "cancelled".to_string(),
                    attempts,
                },
                Err(e) => {
                    warn!(date = %date, attempts = e.attempts(), error = %e, "Frame fetch failed");
                    DateOutcome::Failed {
                        reason: e.to_string(),
                        attempts: e.attempts(),
                    }
                }
            };

        counter!("albedo_dates_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    /// Fuse, account and aggregate frames already fetched for `date`.
    pub fn reduce(&self, date: NaiveDate, frames: &[Frame], attempts: u32) -> DateOutcome {
        let composite = match fuse_frames(frames, &self.tier) {
            Ok(composite) => composite,
            Err(FusionError::NoFrames) => return DateOutcome::NoData,
            Err(e) => {
                warn!(date = %date, error = %e, "Fusion failed");
                return DateOutcome::Failed {
                    reason: e.to_string(),
                    attempts,
                };
            }
        };

        let threshold = self.min_overlap.resolve(composite.spec.cell_area());
        let cells = account(&composite, &self.boundary, threshold);

        match aggregate(&cells, date, self.tier.name(), self.min_count) {
            Some(observation) => {
                counter!("albedo_observations_total").increment(1);
                debug!(
                    date = %date,
                    count = observation.count,
                    mean = observation.mean,
                    "Observation"
                );
                DateOutcome::Ok(Box::new(observation.with_fusion(composite.counters)))
            }
            None => {
                let count = cells.iter().filter(|c| !c.source.is_none()).count();
                debug!(date = %date, count, min_count = self.min_count, "Degenerate date");
                DateOutcome::Degenerate { count }
            }
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("source", &self.source.name())
            .field("tier", &self.tier)
            .field("min_overlap", &self.min_overlap)
            .field("min_count", &self.min_count)
            .field("max_concurrency", &self.max_concurrency)
            .field("retry", &self.retry)
            .finish()
    }
}
