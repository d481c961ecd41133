//! Common types and utilities shared across the glacier albedo pipeline.

pub mod bbox;
pub mod error;
pub mod frame;
pub mod grid;
pub mod sensor;
pub mod time;

pub use bbox::BoundingBox;
pub use error::{AlbedoError, AlbedoResult};
pub use frame::Frame;
pub use grid::{Grid, GridSpec};
pub use sensor::{Product, Sensor, ValidRange};
pub use time::DateRange;
