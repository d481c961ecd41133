//! Pixel accounting: which composite cells belong to the boundary.
//!
//! A cell counts when the exact area of its footprint inside the boundary is
//! positive and at least the minimum overlap. A cell touching several rings
//! or parts is visited once, so it can never be counted twice.

use fusion::{CellSource, Composite};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::polygon::BoundaryPolygon;

/// Default minimum overlap, as a fraction of one cell.
pub const DEFAULT_MIN_OVERLAP_FRACTION: f64 = 0.10;

/// How the sliver threshold is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinOverlap {
    /// Fraction of the full cell area.
    Fraction(f64),
    /// Absolute area in squared map units.
    Area(f64),
}

impl Default for MinOverlap {
    fn default() -> Self {
        MinOverlap::Fraction(DEFAULT_MIN_OVERLAP_FRACTION)
    }
}

impl MinOverlap {
    /// An absolute area override wins over the fraction.
    pub fn from_config(fraction: f64, area: Option<f64>) -> Self {
        match area {
            Some(area) => MinOverlap::Area(area),
            None => MinOverlap::Fraction(fraction),
        }
    }

    /// Threshold area for cells of `cell_area`.
    pub fn resolve(&self, cell_area: f64) -> f64 {
        match *self {
            MinOverlap::Fraction(fraction) => fraction * cell_area,
            MinOverlap::Area(area) => area,
        }
    }
}

/// A composite cell that meaningfully overlaps the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountedCell {
    pub row: usize,
    pub col: usize,
    /// Cell center
    pub x: f64,
    pub y: f64,
    pub value: f32,
    pub source: CellSource,
    /// Footprint area inside the boundary.
    pub intersect_area: f64,
    /// `intersect_area` over the full cell area.
    pub overlap_fraction: f64,
}

/// Restrict a composite to the cells overlapping `boundary` by at least
/// `min_overlap_area`. Output is row-major.
pub fn account(
    composite: &Composite,
    boundary: &BoundaryPolygon,
    min_overlap_area: f64,
) -> Vec<AccountedCell> {
    let spec = &composite.spec;
    let cell_area = spec.cell_area();
    let region = boundary.bbox();

    let Some((rows, cols)) = spec.window(&region) else {
        debug!(date = %composite.date, "Boundary does not overlap the composite grid");
        return Vec::new();
    };

    let mut cells = Vec::new();
    let mut slivers = 0usize;

    for row in rows {
        for col in cols.clone() {
            let Some((value, source)) = composite.cell(row, col) else {
                continue;
            };
            let (Some(center), Some(footprint)) =
                (spec.cell_center(row, col), spec.cell_footprint(row, col))
            else {
                continue;
            };
            if !footprint.intersects(&region) {
                continue;
            }

            let intersect_area = boundary.intersection_area(&footprint);
            if intersect_area <= 0.0 {
                continue;
            }
            if intersect_area < min_overlap_area {
                slivers += 1;
                continue;
            }

            cells.push(AccountedCell {
                row,
                col,
                x: center.x,
                y: center.y,
                value,
                source,
                intersect_area,
                overlap_fraction: intersect_area / cell_area,
            });
        }
    }

    let max_cells = boundary.max_cell_count(cell_area);
    if cells.len() > max_cells {
        warn!(
            date = %composite.date,
            accounted = cells.len(),
            max_cells,
            "Accounted cell count exceeds what the boundary area can hold"
        );
    }

    debug!(
        date = %composite.date,
        accounted = cells.len(),
        slivers,
        min_overlap_area,
        "Accounted boundary cells"
    );

    cells
}

/// Total boundary area covered by accounted cells.
pub fn covered_area(cells: &[AccountedCell]) -> f64 {
    cells.iter().map(|c| c.intersect_area).sum()
}
