//! Boundary intersection and pixel accounting.
//!
//! Loads the region of interest (WKT or GeoJSON), validates it, and decides
//! which composite cells genuinely belong to it using exact footprint
//! clipping instead of a center-inside test or a touch test.

pub mod account;
pub mod clip;
pub mod error;
pub mod geojson;
pub mod polygon;
mod union;
pub mod wkt;

use std::path::Path;

use tracing::info;

pub use account::{account, covered_area, AccountedCell, MinOverlap, DEFAULT_MIN_OVERLAP_FRACTION};
pub use error::{BoundaryError, BoundaryResult};
pub use polygon::{BoundaryPolygon, Point, Polygon, Ring};

impl BoundaryPolygon {
    /// Parse and validate a WKT `POLYGON`/`MULTIPOLYGON`.
    pub fn from_wkt(text: &str) -> BoundaryResult<Self> {
        Self::new(wkt::parse_wkt(text)?)
    }

    /// Parse and validate a GeoJSON geometry, feature or feature collection.
    pub fn from_geojson(text: &str) -> BoundaryResult<Self> {
        Self::new(geojson::parse_geojson(text)?)
    }

    /// Parse either format, detected from the first non-blank character.
    pub fn parse(text: &str) -> BoundaryResult<Self> {
        if text.trim_start().starts_with('{') {
            Self::from_geojson(text)
        } else {
            Self::from_wkt(text)
        }
    }

    /// Read and validate a boundary file.
    pub fn load(path: impl AsRef<Path>) -> BoundaryResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let boundary = Self::parse(&text)?;
        info!(
            path = %path.display(),
            parts = boundary.parts().len(),
            rings = boundary.ring_count(),
            area = boundary.area(),
            "Loaded boundary"
        );
        Ok(boundary)
    }
}
