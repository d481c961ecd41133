//! Per-cell validity masking.

use albedo_common::{Frame, Grid, ValidRange};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::flags::{FlagSet, QaFlag};
use crate::tier::QualityTier;

/// Why a cell was rejected. Checks run in order, so the first failing one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Reflectance code outside the product's valid interval (fill, class or saturated codes).
    OutOfRange,
    /// Basic QA ordinal above the tier maximum.
    BasicQa,
    /// A screened algorithm flag was raised.
    Flag(QaFlag),
}

/// Counts gathered while masking one frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskStats {
    pub total: usize,
    pub valid: usize,
    pub out_of_range: usize,
    pub basic_qa_rejected: usize,
    pub flag_rejected: usize,
    /// False when the tier asked for flag screening but the frame had no flag band.
    pub flags_applied: bool,
}

impl MaskStats {
    fn record(&mut self, rejection: Option<Rejection>) {
        self.total += 1;
        match rejection {
            None => self.valid += 1,
            Some(Rejection::OutOfRange) => self.out_of_range += 1,
            Some(Rejection::BasicQa) => self.basic_qa_rejected += 1,
            Some(Rejection::Flag(_)) => self.flag_rejected += 1,
        }
    }

    /// Fraction of cells that passed.
    pub fn valid_fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }
}

/// Boolean validity grid with the same shape as the frame it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidityGrid {
    pub grid: Grid<bool>,
    pub stats: MaskStats,
}

impl ValidityGrid {
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        self.grid.get(row, col).copied().unwrap_or(false)
    }

    pub fn valid_count(&self) -> usize {
        self.stats.valid
    }
}

/// Decide a single cell. `flags` is `None` when flag screening is skipped.
pub fn check_cell(
    code: u16,
    basic_qa: u8,
    flags: Option<(u16, FlagSet)>,
    range: &ValidRange,
    tier: &QualityTier,
) -> Option<Rejection> {
    if !range.contains(code) {
        return Some(Rejection::OutOfRange);
    }
    if basic_qa > tier.basic_qa_max() {
        return Some(Rejection::BasicQa);
    }
    let (flag_code, screened) = flags?;
    screened.first_raised(flag_code).map(Rejection::Flag)
}

/// Build the validity grid for `frame` under `tier`.
///
/// A missing flag band degrades to range + basic QA screening only.
pub fn mask(frame: &Frame, tier: &QualityTier) -> ValidityGrid {
    let range = frame.product().valid_range();
    let reflectance = frame.reflectance();
    let qa_basic = frame.qa_basic();

    let screened = tier.effective_flags();
    let flag_band = if screened.is_empty() {
        None
    } else {
        match frame.qa_flags() {
            Some(band) => Some(band),
            None => {
                debug!(
                    sensor = %frame.sensor(),
                    date = %frame.date(),
                    tier = %tier.name(),
                    "No algorithm flag band; using basic QA only"
                );
                None
            }
        }
    };

    let mut stats = MaskStats {
        flags_applied: flag_band.is_some(),
        ..Default::default()
    };

    let valid: Vec<bool> = reflectance
        .iter()
        .zip(qa_basic.iter())
        .enumerate()
        .map(|(i, (&code, &basic))| {
            let flags = flag_band
                .and_then(|band| band.as_slice().get(i).copied())
                .map(|flag_code| (flag_code, screened));
            let rejection = check_cell(code, basic, flags, &range, tier);
            stats.record(rejection);
            rejection.is_none()
        })
        .collect();

    let grid = Grid::from_fn(reflectance.width(), reflectance.height(), |row, col| {
        valid[row * reflectance.width() + col]
    });

    debug!(
        sensor = %frame.sensor(),
        date = %frame.date(),
        valid = stats.valid,
        total = stats.total,
        out_of_range = stats.out_of_range,
        basic_qa_rejected = stats.basic_qa_rejected,
        flag_rejected = stats.flag_rejected,
        "Masked frame"
    );

    ValidityGrid { grid, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use albedo_common::{GridSpec, Product, Sensor};
    use chrono::NaiveDate;

    fn frame(codes: Vec<u16>, basic: Vec<u8>, flags: Option<Vec<u16>>) -> Frame {
        let n = codes.len();
        let spec = GridSpec::new(n, 1, 500.0, 0.0, 500.0);
        Frame::new(
            Sensor::Terra,
            NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
            Product::SnowAlbedoDaily,
            spec,
            Grid::new(n, 1, codes).unwrap(),
            Grid::new(n, 1, basic).unwrap(),
            flags.map(|f| Grid::new(n, 1, f).unwrap()),
        )
        .unwrap()
    }

    #[test]
    fn test_range_check_is_inclusive() {
        let f = frame(vec![4, 5, 99, 100, 250], vec![0; 5], None);
        let result = mask(&f, &QualityTier::relaxed());
        assert_eq!(result.grid.as_slice(), &[false, true, true, false, false]);
        assert_eq!(result.stats.out_of_range, 3);
    }

    #[test]
    fn test_basic_qa_threshold() {
        let f = frame(vec![50; 4], vec![0, 1, 2, 3], Some(vec![0; 4]));
        assert_eq!(
            mask(&f, &QualityTier::strict()).grid.as_slice(),
            &[true, false, false, false]
        );
        assert_eq!(
            mask(&f, &QualityTier::balanced()).grid.as_slice(),
            &[true, true, false, false]
        );
        assert_eq!(
            mask(&f, &QualityTier::relaxed()).grid.as_slice(),
            &[true, true, true, false]
        );
    }

    #[test]
    fn test_cloud_flag_rejects_in_every_tier() {
        let cloud = QaFlag::ProbableCloud.mask();
        let f = frame(vec![50, 50], vec![0, 0], Some(vec![0, cloud]));
        for tier in [
            QualityTier::strict(),
            QualityTier::balanced(),
            QualityTier::relaxed(),
        ] {
            let result = mask(&f, &tier);
            assert_eq!(result.grid.as_slice(), &[true, false]);
            assert_eq!(result.stats.flag_rejected, 1);
        }
    }

    #[test]
    fn test_temperature_flag_only_screened_when_enabled() {
        let temp = QaFlag::TemperatureHeight.mask();
        let f = frame(vec![50], vec![0], Some(vec![temp]));

        assert!(mask(&f, &QualityTier::balanced()).is_valid(0, 0));
        assert!(!mask(&f, &QualityTier::balanced().with_optional_screens(true)).is_valid(0, 0));
        assert!(!mask(&f, &QualityTier::strict()).is_valid(0, 0));
    }

    #[test]
    fn test_missing_flag_band_degrades_to_basic_qa() {
        let f = frame(vec![50, 50], vec![0, 2], None);
        let result = mask(&f, &QualityTier::strict());
        assert!(!result.stats.flags_applied);
        assert_eq!(result.grid.as_slice(), &[true, false]);
    }

    #[test]
    fn test_check_cell_reports_first_failure() {
        let range = Product::SnowAlbedoDaily.valid_range();
        let tier = QualityTier::strict();
        let all = tier.effective_flags();

        assert_eq!(
            check_cell(200, 3, Some((0xFF, all)), &range, &tier),
            Some(Rejection::OutOfRange)
        );
        assert_eq!(
            check_cell(50, 3, Some((0xFF, all)), &range, &tier),
            Some(Rejection::BasicQa)
        );
        assert_eq!(
            check_cell(50, 0, Some((0b10_0001, all)), &range, &tier),
            Some(Rejection::Flag(QaFlag::InlandWater))
        );
        assert_eq!(check_cell(50, 0, Some((0, all)), &range, &tier), None);
    }
}
