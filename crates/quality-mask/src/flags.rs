//! Algorithm QA flag table.
//!
//! This is the only place that knows what each bit of the algorithm flag band
//! means. Everything else addresses flags through [`QaFlag`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QualityError;

/// One bit of the algorithm QA flag band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QaFlag {
    InlandWater,
    LowVisible,
    LowNdsi,
    TemperatureHeight,
    HighSwir,
    ProbableCloud,
    ProbablyClear,
    LowIllumination,
}

/// Row of the flag table.
#[derive(Debug, Clone, Copy)]
pub struct FlagInfo {
    pub flag: QaFlag,
    pub bit: u8,
    pub name: &'static str,
    pub description: &'static str,
}

/// Flag table keyed by bit index (entry `i` describes bit `i`).
pub const FLAG_TABLE: [FlagInfo; 8] = [
    FlagInfo {
        flag: QaFlag::InlandWater,
        bit: 0,
        name: "inland_water",
        description: "cell contains inland water",
    },
    FlagInfo {
        flag: QaFlag::LowVisible,
        bit: 1,
        name: "low_visible",
        description: "low visible reflectance",
    },
    FlagInfo {
        flag: QaFlag::LowNdsi,
        bit: 2,
        name: "low_ndsi",
        description: "low NDSI",
    },
    FlagInfo {
        flag: QaFlag::TemperatureHeight,
        bit: 3,
        name: "temperature_height",
        description: "temperature/height screen failed; unreliable in steep terrain",
    },
    FlagInfo {
        flag: QaFlag::HighSwir,
        bit: 4,
        name: "high_swir",
        description: "high shortwave-infrared reflectance screen",
    },
    FlagInfo {
        flag: QaFlag::ProbableCloud,
        bit: 5,
        name: "probable_cloud",
        description: "probably cloudy",
    },
    FlagInfo {
        flag: QaFlag::ProbablyClear,
        bit: 6,
        name: "probably_clear",
        description: "cloud mask reports probably clear",
    },
    FlagInfo {
        flag: QaFlag::LowIllumination,
        bit: 7,
        name: "low_illumination",
        description: "high solar zenith / low illumination",
    },
];

impl QaFlag {
    fn info(&self) -> &'static FlagInfo {
        // FLAG_TABLE is ordered by declaration order of the enum.
        &FLAG_TABLE[*self as usize]
    }

    /// Bit index within the flag band.
    pub fn bit(&self) -> u8 {
        self.info().bit
    }

    /// Single-bit mask for this flag.
    pub fn mask(&self) -> u16 {
        1 << self.bit()
    }

    pub fn name(&self) -> &'static str {
        self.info().name
    }

    pub fn description(&self) -> &'static str {
        self.info().description
    }

    /// Whether this flag is raised in a flag-band code.
    pub fn is_set(&self, code: u16) -> bool {
        code & self.mask() != 0
    }

    /// Look up a flag by bit index.
    pub fn from_bit(bit: u8) -> Result<Self, QualityError> {
        FLAG_TABLE
            .get(bit as usize)
            .map(|info| info.flag)
            .ok_or(QualityError::UnknownBit(bit))
    }

    /// Look up a flag by its table name. The `no_` prefix used by older
    /// configs (e.g. `no_clouds`) is accepted for the cloud and water flags.
    pub fn from_name(name: &str) -> Result<Self, QualityError> {
        let normalized = name.trim().to_lowercase();
        if let Some(info) = FLAG_TABLE.iter().find(|i| i.name == normalized) {
            return Ok(info.flag);
        }
        match normalized.as_str() {
            "no_inland_water" | "water" => Ok(QaFlag::InlandWater),
            "no_low_visible" => Ok(QaFlag::LowVisible),
            "no_low_ndsi" => Ok(QaFlag::LowNdsi),
            "no_temp_issues" => Ok(QaFlag::TemperatureHeight),
            "no_high_swir" | "no_spatial_issues" => Ok(QaFlag::HighSwir),
            "no_clouds" | "cloud" => Ok(QaFlag::ProbableCloud),
            "no_cloud_clear" => Ok(QaFlag::ProbablyClear),
            "no_shadows" => Ok(QaFlag::LowIllumination),
            _ => Err(QualityError::UnknownFlag(name.to_string())),
        }
    }
}

impl fmt::Display for QaFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QaFlag {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// A set of QA flags, stored as the bit mask they cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<QaFlag>", into = "Vec<QaFlag>")]
pub struct FlagSet(u16);

impl FlagSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn with(mut self, flag: QaFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn insert(&mut self, flag: QaFlag) {
        self.0 |= flag.mask();
    }

    pub fn contains(&self, flag: QaFlag) -> bool {
        self.0 & flag.mask() != 0
    }

    pub fn union(&self, other: &FlagSet) -> FlagSet {
        FlagSet(self.0 | other.0)
    }

    /// Every flag in `other` is also in `self`.
    pub fn is_superset(&self, other: &FlagSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Combined bit mask of the set.
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// First flag of this set raised in `code`, in bit order.
    pub fn first_raised(&self, code: u16) -> Option<QaFlag> {
        let hits = code & self.0;
        if hits == 0 {
            return None;
        }
        QaFlag::from_bit(hits.trailing_zeros() as u8).ok()
    }

    /// Flags in bit order.
    pub fn iter(&self) -> impl Iterator<Item = QaFlag> + '_ {
        FLAG_TABLE
            .iter()
            .map(|info| info.flag)
            .filter(move |flag| self.contains(*flag))
    }

    /// Parse a list of flag names.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, QualityError> {
        names.iter().try_fold(FlagSet::empty(), |set, name| {
            Ok(set.with(QaFlag::from_name(name.as_ref())?))
        })
    }
}

impl FromIterator<QaFlag> for FlagSet {
    fn from_iter<I: IntoIterator<Item = QaFlag>>(iter: I) -> Self {
        iter.into_iter().fold(FlagSet::empty(), FlagSet::with)
    }
}

impl From<Vec<QaFlag>> for FlagSet {
    fn from(flags: Vec<QaFlag>) -> Self {
        flags.into_iter().collect()
    }
}

impl From<FlagSet> for Vec<QaFlag> {
    fn from(set: FlagSet) -> Self {
        set.iter().collect()
    }
}

impl fmt::Display for FlagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|flag| flag.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_keyed_by_bit() {
        for (i, info) in FLAG_TABLE.iter().enumerate() {
            assert_eq!(info.bit as usize, i);
            assert_eq!(info.flag.bit(), info.bit);
            assert_eq!(QaFlag::from_bit(info.bit).unwrap(), info.flag);
            assert_eq!(QaFlag::from_name(info.name).unwrap(), info.flag);
        }
    }

    #[test]
    fn test_known_bit_meanings() {
        assert_eq!(QaFlag::InlandWater.mask(), 1);
        assert_eq!(QaFlag::ProbableCloud.mask(), 32);
        assert_eq!(QaFlag::LowIllumination.mask(), 128);
        assert!(QaFlag::from_bit(8).is_err());
    }

    #[test]
    fn test_legacy_names() {
        assert_eq!(QaFlag::from_name("no_clouds").unwrap(), QaFlag::ProbableCloud);
        assert_eq!(
            QaFlag::from_name("NO_TEMP_ISSUES").unwrap(),
            QaFlag::TemperatureHeight
        );
        assert!(QaFlag::from_name("no_aliens").is_err());
    }

    #[test]
    fn test_flag_set_operations() {
        let water_cloud: FlagSet = [QaFlag::InlandWater, QaFlag::ProbableCloud]
            .into_iter()
            .collect();
        let only_water = FlagSet::empty().with(QaFlag::InlandWater);

        assert!(water_cloud.is_superset(&only_water));
        assert!(!only_water.is_superset(&water_cloud));
        assert_eq!(water_cloud.len(), 2);
        assert_eq!(water_cloud.bits(), 0b10_0001);
        assert_eq!(water_cloud.first_raised(0b10_0000), Some(QaFlag::ProbableCloud));
        assert_eq!(water_cloud.first_raised(0b00_0010), None);
    }

    #[test]
    fn test_flag_set_serde_as_names() {
        let set = FlagSet::from_names(&["probable_cloud", "inland_water"]).unwrap();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["inland_water","probable_cloud"]"#);
        let back: FlagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
