//! Synthetic frame generators.
//!
//! Frames default to a clean observation: every cell carries reflectance code
//! 60 (0.60 albedo), basic QA 0 and an all-clear flag band. Overrides are
//! applied per cell.

use albedo_common::{Frame, Grid, GridSpec, Product, Sensor};
use chrono::NaiveDate;

/// Code outside every product's valid interval, used to blank a cell.
pub const FILL_CODE: u16 = 65535;

/// Builder for test frames.
///
/// # Example
///
/// ```
/// use albedo_common::Sensor;
/// use test_utils::{melt_date, scenario_grid, FrameBuilder};
///
/// let frame = FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid())
///     .code(70)
///     .invalid_at(2, 2)
///     .build();
/// assert_eq!(frame.reflectance().get(0, 0), Some(&70));
/// ```
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    sensor: Sensor,
    date: NaiveDate,
    product: Product,
    spec: GridSpec,
    reflectance: Vec<u16>,
    qa_basic: Vec<u8>,
    qa_flags: Option<Vec<u16>>,
}

impl FrameBuilder {
    pub fn new(sensor: Sensor, date: NaiveDate, spec: GridSpec) -> Self {
        let n = spec.len();
        Self {
            sensor,
            date,
            product: Product::SnowAlbedoDaily,
            spec,
            reflectance: vec![60; n],
            qa_basic: vec![0; n],
            qa_flags: Some(vec![0; n]),
        }
    }

    pub fn product(mut self, product: Product) -> Self {
        self.product = product;
        self
    }

    /// Set every cell's reflectance code.
    pub fn code(mut self, code: u16) -> Self {
        self.reflectance.iter_mut().for_each(|c| *c = code);
        self
    }

    /// Set every cell's basic QA.
    pub fn basic_qa(mut self, qa: u8) -> Self {
        self.qa_basic.iter_mut().for_each(|q| *q = qa);
        self
    }

    pub fn code_at(mut self, row: usize, col: usize, code: u16) -> Self {
        let i = self.spec.flat_index(row, col);
        self.reflectance[i] = code;
        self
    }

    pub fn basic_qa_at(mut self, row: usize, col: usize, qa: u8) -> Self {
        let i = self.spec.flat_index(row, col);
        self.qa_basic[i] = qa;
        self
    }

    /// Set the flag-band code of one cell (adds a flag band if missing).
    pub fn flags_at(mut self, row: usize, col: usize, bits: u16) -> Self {
        let n = self.spec.len();
        let i = self.spec.flat_index(row, col);
        self.qa_flags.get_or_insert_with(|| vec![0; n])[i] = bits;
        self
    }

    /// Blank one cell with a fill code.
    pub fn invalid_at(self, row: usize, col: usize) -> Self {
        self.code_at(row, col, FILL_CODE)
    }

    /// Blank every cell.
    pub fn all_invalid(self) -> Self {
        self.code(FILL_CODE)
    }

    /// Drop the algorithm flag band.
    pub fn without_flags(mut self) -> Self {
        self.qa_flags = None;
        self
    }

    pub fn build(self) -> Frame {
        let (w, h) = (self.spec.nx, self.spec.ny);
        Frame::new(
            self.sensor,
            self.date,
            self.product,
            self.spec,
            Grid::new(w, h, self.reflectance).expect("reflectance shape"),
            Grid::new(w, h, self.qa_basic).expect("qa_basic shape"),
            self.qa_flags
                .map(|f| Grid::new(w, h, f).expect("qa_flags shape")),
        )
        .expect("valid test frame")
    }
}

/// Clean frame for the scenario grid.
pub fn clean_frame(sensor: Sensor, date: NaiveDate) -> Frame {
    FrameBuilder::new(sensor, date, crate::scenario_grid()).build()
}

/// Reflectance codes with a deterministic gradient: `5 + (row * width + col) % 95`.
pub fn gradient_codes(spec: &GridSpec) -> Vec<u16> {
    (0..spec.len()).map(|i| 5 + (i % 95) as u16).collect()
}
