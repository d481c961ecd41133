//! Raw single-sensor raster frames.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AlbedoError, AlbedoResult};
use crate::grid::{Grid, GridSpec};
use crate::sensor::{Product, Sensor};

/// One sensor's raw observation of the region for one day.
///
/// All bands share the frame's [`GridSpec`]. Frames are immutable once built;
/// construction and decoding both go through shape validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    sensor: Sensor,
    date: NaiveDate,
    #[serde(default)]
    product: Product,
    spec: GridSpec,
    reflectance: Grid<u16>,
    qa_basic: Grid<u8>,
    #[serde(default)]
    qa_flags: Option<Grid<u16>>,
}

impl Frame {
    /// Build a frame, checking every band against the grid shape.
    pub fn new(
        sensor: Sensor,
        date: NaiveDate,
        product: Product,
        spec: GridSpec,
        reflectance: Grid<u16>,
        qa_basic: Grid<u8>,
        qa_flags: Option<Grid<u16>>,
    ) -> AlbedoResult<Self> {
        let frame = Self {
            sensor,
            date,
            product,
            spec,
            reflectance,
            qa_basic,
            qa_flags,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Decode a JSON-encoded frame and validate it.
    pub fn from_json(bytes: &[u8]) -> AlbedoResult<Self> {
        let frame: Frame = serde_json::from_slice(bytes)?;
        frame.validate()?;
        Ok(frame)
    }

    /// Check grid geometry and that all bands match it.
    pub fn validate(&self) -> AlbedoResult<()> {
        self.spec.validate()?;

        let expected = self.spec.len();
        if !self.reflectance.matches(&self.spec) {
            return Err(AlbedoError::shape_mismatch(
                "reflectance",
                expected,
                self.reflectance.len(),
            ));
        }
        if !self.qa_basic.matches(&self.spec) {
            return Err(AlbedoError::shape_mismatch(
                "qa_basic",
                expected,
                self.qa_basic.len(),
            ));
        }
        if let Some(flags) = &self.qa_flags {
            if !flags.matches(&self.spec) {
                return Err(AlbedoError::shape_mismatch(
                    "qa_flags",
                    expected,
                    flags.len(),
                ));
            }
        }
        Ok(())
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn reflectance(&self) -> &Grid<u16> {
        &self.reflectance
    }

    pub fn qa_basic(&self) -> &Grid<u8> {
        &self.qa_basic
    }

    /// Algorithm flag band, if the sensor delivered one.
    pub fn qa_flags(&self) -> Option<&Grid<u16>> {
        self.qa_flags.as_ref()
    }
}
