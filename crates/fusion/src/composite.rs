//! The fused single-date raster.

use albedo_common::{Grid, GridSpec, Sensor};
use chrono::NaiveDate;
use quality_mask::{MaskStats, TierName};
use serde::{Deserialize, Serialize};

/// Which sensor a composite cell's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellSource {
    Terra,
    Aqua,
    /// No valid observation from either sensor.
    None,
}

impl CellSource {
    pub fn is_none(&self) -> bool {
        matches!(self, CellSource::None)
    }

    pub fn sensor(&self) -> Option<Sensor> {
        match self {
            CellSource::Terra => Some(Sensor::Terra),
            CellSource::Aqua => Some(Sensor::Aqua),
            CellSource::None => None,
        }
    }
}

impl From<Sensor> for CellSource {
    fn from(sensor: Sensor) -> Self {
        match sensor {
            Sensor::Terra => CellSource::Terra,
            Sensor::Aqua => CellSource::Aqua,
        }
    }
}

/// Composite-level provenance counters.
///
/// Every cell lands in exactly one bucket, so the four fields sum to the
/// grid size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionCounters {
    /// Valid only in Terra.
    pub terra_only: usize,
    /// Valid only in Aqua (gap-filled).
    pub aqua_only: usize,
    /// Valid in both; Terra was used.
    pub both: usize,
    /// Valid in neither.
    pub neither: usize,
}

impl FusionCounters {
    pub fn total(&self) -> usize {
        self.terra_only + self.aqua_only + self.both + self.neither
    }

    /// Cells that ended up with a value.
    pub fn filled(&self) -> usize {
        self.terra_only + self.aqua_only + self.both
    }

    pub(crate) fn record(&mut self, terra_valid: bool, aqua_valid: bool) {
        match (terra_valid, aqua_valid) {
            (true, true) => self.both += 1,
            (true, false) => self.terra_only += 1,
            (false, true) => self.aqua_only += 1,
            (false, false) => self.neither += 1,
        }
    }
}

/// One date's fused raster.
///
/// `values` holds scaled reflectance; cells whose source is
/// [`CellSource::None`] hold NaN and must be skipped downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composite {
    pub date: NaiveDate,
    pub spec: GridSpec,
    pub tier: TierName,
    pub values: Grid<f32>,
    pub sources: Grid<CellSource>,
    pub counters: FusionCounters,
    /// Masking statistics of each contributing frame, Terra first.
    pub masks: Vec<(Sensor, MaskStats)>,
}

impl Composite {
    /// Value and source of a cell, or `None` when the cell has no contributor.
    pub fn cell(&self, row: usize, col: usize) -> Option<(f32, CellSource)> {
        let source = *self.sources.get(row, col)?;
        if source.is_none() {
            return None;
        }
        self.values.get(row, col).map(|v| (*v, source))
    }

    /// Number of cells with a contributor.
    pub fn filled_count(&self) -> usize {
        self.sources.iter().filter(|s| !s.is_none()).count()
    }

    /// Bit-level fingerprint of the value and source grids.
    ///
    /// Two composites with equal fingerprints are byte-identical, NaN cells included.
    pub fn fingerprint(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * 5);
        for (value, source) in self.values.iter().zip(self.sources.iter()) {
            bytes.extend_from_slice(&value.to_bits().to_le_bytes());
            bytes.push(match source {
                CellSource::Terra => b'T',
                CellSource::Aqua => b'A',
                CellSource::None => b'-',
            });
        }
        bytes
    }
}
