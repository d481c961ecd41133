//! Sensor identities and product value ranges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AlbedoError;

/// The two sensors with overlapping daily coverage.
///
/// Terra has the documented higher reliability for snow albedo and always wins
/// when both sensors observe a cell on the same day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    /// Morning overpass (MOD10A1)
    Terra,
    /// Afternoon overpass (MYD10A1)
    Aqua,
}

impl Sensor {
    /// All sensors in priority order.
    pub const ALL: [Sensor; 2] = [Sensor::Terra, Sensor::Aqua];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensor::Terra => "terra",
            Sensor::Aqua => "aqua",
        }
    }

    /// Lower is preferred.
    pub fn priority(&self) -> u8 {
        match self {
            Sensor::Terra => 0,
            Sensor::Aqua => 1,
        }
    }
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sensor {
    type Err = AlbedoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "terra" | "mod10a1" | "a" => Ok(Sensor::Terra),
            "aqua" | "myd10a1" | "b" => Ok(Sensor::Aqua),
            other => Err(AlbedoError::UnknownSensor(other.to_string())),
        }
    }
}

/// Inclusive interval of valid raw codes plus the scale/offset to physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidRange {
    pub min: u16,
    pub max: u16,
    pub scale: f64,
    pub offset: f64,
}

impl ValidRange {
    pub const fn new(min: u16, max: u16, scale: f64, offset: f64) -> Self {
        Self {
            min,
            max,
            scale,
            offset,
        }
    }

    /// Whether a raw code lies in the documented valid interval.
    pub fn contains(&self, code: u16) -> bool {
        code >= self.min && code <= self.max
    }

    /// Convert a raw code to reflectance.
    pub fn to_physical(&self, code: u16) -> f32 {
        (code as f64 * self.scale + self.offset) as f32
    }
}

/// Reflectance products a frame can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    /// Daily snow albedo tile, percent codes. Codes above 100 are fill/class values.
    #[default]
    SnowAlbedoDaily,
    /// Shortwave black-sky broadband albedo, 0.001 scale.
    BroadbandAlbedo,
}

impl Product {
    pub fn valid_range(&self) -> ValidRange {
        match self {
            Product::SnowAlbedoDaily => ValidRange::new(5, 99, 0.01, 0.0),
            Product::BroadbandAlbedo => ValidRange::new(0, 1000, 0.001, 0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::SnowAlbedoDaily => "snow_albedo_daily",
            Product::BroadbandAlbedo => "broadband_albedo",
        }
    }
}

impl FromStr for Product {
    type Err = AlbedoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "snow_albedo_daily" | "snow" | "mod10a1" => Ok(Product::SnowAlbedoDaily),
            "broadband_albedo" | "broadband" | "mcd43a3" => Ok(Product::BroadbandAlbedo),
            other => Err(AlbedoError::UnknownProduct(other.to_string())),
        }
    }
}
