//! Per-date outcomes and the run report.

use std::collections::BTreeMap;

use aggregator::Observation;
use chrono::NaiveDate;
use quality_mask::TierName;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of processing one date.
#[derive(Debug, Clone, PartialEq)]
pub enum DateOutcome {
    /// An observation was produced.
    Ok(Box<Observation>),
    /// The source had no frames for the date.
    NoData,
    /// Frames existed but too few accounted cells remained.
    Degenerate { count: usize },
    /// Retries exhausted, an invalid response, or cancellation.
    Failed { reason: String, attempts: u32 },
}

impl DateOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            DateOutcome::Ok(_) => "ok",
            DateOutcome::NoData => "no_data",
            DateOutcome::Degenerate { .. } => "degenerate",
            DateOutcome::Failed { .. } => "failed",
        }
    }

    pub fn observation(&self) -> Option<&Observation> {
        match self {
            DateOutcome::Ok(obs) => Some(obs.as_ref()),
            _ => None,
        }
    }

    pub fn status(&self) -> DateStatus {
        match self {
            DateOutcome::Ok(obs) => DateStatus::Ok { count: obs.count },
            DateOutcome::NoData => DateStatus::NoData,
            DateOutcome::Degenerate { count } => DateStatus::Degenerate { count: *count },
            DateOutcome::Failed { reason, attempts } => DateStatus::Failed {
                reason: reason.clone(),
                attempts: *attempts,
            },
        }
    }
}

/// Serializable per-date status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DateStatus {
    Ok { count: usize },
    NoData,
    Degenerate { count: usize },
    Failed { reason: String, attempts: u32 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ok: usize,
    pub no_data: usize,
    pub degenerate: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &DateOutcome) {
        match outcome {
            DateOutcome::Ok(_) => self.ok += 1,
            DateOutcome::NoData => self.no_data += 1,
            DateOutcome::Degenerate { .. } => self.degenerate += 1,
            DateOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.no_data + self.degenerate + self.failed
    }
}

/// Everything a run produced: the observation table plus one status per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub quality_tier: TierName,
    /// Observations in ascending date order.
    pub observations: Vec<Observation>,
    pub outcomes: BTreeMap<NaiveDate, DateStatus>,
    pub summary: RunSummary,
}

impl RunReport {
    /// Build a report from per-date outcomes in any order.
    pub fn from_outcomes(
        run_id: Uuid,
        quality_tier: TierName,
        outcomes: impl IntoIterator<Item = (NaiveDate, DateOutcome)>,
    ) -> Self {
        let sorted: BTreeMap<NaiveDate, DateOutcome> = outcomes.into_iter().collect();

        let mut summary = RunSummary::default();
        let mut observations = Vec::new();
        let mut statuses = BTreeMap::new();
        for (date, outcome) in sorted {
            summary.record(&outcome);
            statuses.insert(date, outcome.status());
            if let DateOutcome::Ok(obs) = outcome {
                observations.push(*obs);
            }
        }

        Self {
            run_id,
            quality_tier,
            observations,
            outcomes: statuses,
            summary,
        }
    }

    pub fn observation(&self, date: NaiveDate) -> Option<&Observation> {
        self.observations.iter().find(|o| o.date == date)
    }

    pub fn status(&self, date: NaiveDate) -> Option<&DateStatus> {
        self.outcomes.get(&date)
    }

    /// Dates that did not complete and may be worth re-running.
    pub fn failed_dates(&self) -> Vec<NaiveDate> {
        self.outcomes
            .iter()
            .filter(|(_, s)| matches!(s, DateStatus::Failed { .. }))
            .map(|(d, _)| *d)
            .collect()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
