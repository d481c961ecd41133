//! One output row per date.

use boundary::{covered_area, AccountedCell};
use chrono::NaiveDate;
use fusion::{CellSource, FusionCounters};
use quality_mask::TierName;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stats::RunningStats;

/// Default minimum number of accounted cells for an observation.
pub const DEFAULT_MIN_COUNT: usize = 1;

/// Accounted cells per contributing sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub terra: usize,
    pub aqua: usize,
}

impl SourceBreakdown {
    pub fn from_cells(cells: &[AccountedCell]) -> Self {
        cells.iter().fold(Self::default(), |mut acc, cell| {
            match cell.source {
                CellSource::Terra => acc.terra += 1,
                CellSource::Aqua => acc.aqua += 1,
                CellSource::None => {}
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.terra + self.aqua
    }
}

/// Summary statistics of one date's accounted cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub source_breakdown: SourceBreakdown,
    pub quality_tier: TierName,
    /// Boundary area covered by the accounted cells.
    pub covered_area: f64,
    /// Composite-wide fusion counters, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<FusionCounters>,
}

impl Observation {
    pub fn with_fusion(mut self, counters: FusionCounters) -> Self {
        self.fusion = Some(counters);
        self
    }
}

/// Reduce accounted cells to an observation.
///
/// Returns `None` for an empty set or fewer than `min_count` cells. Cells
/// without a source are skipped.
pub fn aggregate(
    cells: &[AccountedCell],
    date: NaiveDate,
    tier: TierName,
    min_count: usize,
) -> Option<Observation> {
    let cells: Vec<AccountedCell> = cells
        .iter()
        .filter(|c| !c.source.is_none())
        .copied()
        .collect();

    let stats: RunningStats = cells.iter().map(|c| c.value as f64).collect();
    let summary = stats.finish()?;

    if summary.count < min_count.max(1) {
        debug!(
            date = %date,
            count = summary.count,
            min_count,
            "Too few cells for an observation"
        );
        return None;
    }

    Some(Observation {
        date,
        mean: summary.mean,
        std: summary.std,
        count: summary.count,
        min: summary.min,
        max: summary.max,
        source_breakdown: SourceBreakdown::from_cells(&cells),
        quality_tier: tier,
        covered_area: covered_area(&cells),
        fusion: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(col: usize, value: f32, source: CellSource) -> AccountedCell {
        AccountedCell {
            row: 0,
            col,
            x: col as f64 * 500.0 + 250.0,
            y: 250.0,
            value,
            source,
            intersect_area: 250_000.0,
            overlap_fraction: 1.0,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 7, 20).unwrap()
    }

    #[test]
    fn test_empty_input_is_none() {
        assert!(aggregate(&[], date(), TierName::Balanced, 1).is_none());
        // min_count 0 still never emits an empty observation
        assert!(aggregate(&[], date(), TierName::Balanced, 0).is_none());
    }

    #[test]
    fn test_statistics_and_breakdown() {
        let cells = vec![
            cell(0, 0.5, CellSource::Terra),
            cell(1, 0.7, CellSource::Terra),
            cell(2, 0.6, CellSource::Aqua),
        ];
        let obs = aggregate(&cells, date(), TierName::Strict, 1).unwrap();

        assert_eq!(obs.count, 3);
        assert!((obs.mean - 0.6).abs() < 1e-6);
        assert!((obs.std - (0.02f64 / 3.0).sqrt()).abs() < 1e-6);
        assert!((obs.min - 0.5).abs() < 1e-6);
        assert!((obs.max - 0.7).abs() < 1e-6);
        assert_eq!(obs.source_breakdown, SourceBreakdown { terra: 2, aqua: 1 });
        assert_eq!(obs.quality_tier, TierName::Strict);
        assert_eq!(obs.covered_area, 750_000.0);
    }

    #[test]
    fn test_below_min_count() {
        let cells = vec![cell(0, 0.5, CellSource::Terra), cell(1, 0.6, CellSource::Aqua)];
        assert!(aggregate(&cells, date(), TierName::Relaxed, 3).is_none());
        assert!(aggregate(&cells, date(), TierName::Relaxed, 2).is_some());
    }

    #[test]
    fn test_unsourced_cells_skipped() {
        let cells = vec![cell(0, 0.5, CellSource::Terra), cell(1, f32::NAN, CellSource::None)];
        let obs = aggregate(&cells, date(), TierName::Balanced, 1).unwrap();
        assert_eq!(obs.count, 1);
        assert_eq!(obs.source_breakdown.total(), 1);
    }
}
