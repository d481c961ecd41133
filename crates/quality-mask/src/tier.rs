//! Named quality tiers.
//!
//! Tiers are plain values handed to the mask engine. The three presets are
//! ordered so that a stricter tier never accepts a cell a looser tier rejects:
//! its `basic_qa_max` is no higher and its effective flag set is a superset.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{QualityError, Result};
use crate::flags::{FlagSet, QaFlag};

/// Names of the selectable tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierName {
    Strict,
    Balanced,
    Relaxed,
    Custom,
}

impl TierName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierName::Strict => "strict",
            TierName::Balanced => "balanced",
            TierName::Relaxed => "relaxed",
            TierName::Custom => "custom",
        }
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TierName {
    type Err = QualityError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(TierName::Strict),
            "balanced" | "standard" => Ok(TierName::Balanced),
            "relaxed" => Ok(TierName::Relaxed),
            "custom" => Ok(TierName::Custom),
            other => Err(QualityError::UnknownTier(other.to_string())),
        }
    }
}

/// Acceptance rules applied to each cell's QA bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityTier {
    name: TierName,
    /// Highest accepted basic QA ordinal (0 = best).
    basic_qa_max: u8,
    /// Flags that must be clear whenever a flag band is available.
    required_flag_clear: FlagSet,
    /// Flags that must be clear only when `screen_optional` is on.
    optional_flag_clear: FlagSet,
    screen_optional: bool,
}

impl QualityTier {
    /// Best basic QA only; also screens temperature/height, SWIR and illumination.
    pub fn strict() -> Self {
        Self {
            name: TierName::Strict,
            basic_qa_max: 0,
            required_flag_clear: FlagSet::from_iter([
                QaFlag::InlandWater,
                QaFlag::LowVisible,
                QaFlag::LowNdsi,
                QaFlag::TemperatureHeight,
                QaFlag::ProbableCloud,
                QaFlag::ProbablyClear,
            ]),
            optional_flag_clear: FlagSet::from_iter([QaFlag::HighSwir, QaFlag::LowIllumination]),
            screen_optional: true,
        }
    }

    /// Best and good basic QA. The temperature/height and SWIR screens are
    /// available but off, since they misfire on steep glacier terrain.
    pub fn balanced() -> Self {
        Self {
            name: TierName::Balanced,
            basic_qa_max: 1,
            required_flag_clear: FlagSet::from_iter([
                QaFlag::InlandWater,
                QaFlag::LowVisible,
                QaFlag::LowNdsi,
                QaFlag::ProbableCloud,
                QaFlag::ProbablyClear,
            ]),
            optional_flag_clear: FlagSet::from_iter([QaFlag::TemperatureHeight, QaFlag::HighSwir]),
            screen_optional: false,
        }
    }

    /// Best, good and fair basic QA. Water, low-signal and both cloud-mask
    /// flags are still screened; none of the terrain-sensitive ones are.
    pub fn relaxed() -> Self {
        Self {
            name: TierName::Relaxed,
            basic_qa_max: 2,
            required_flag_clear: FlagSet::from_iter([
                QaFlag::InlandWater,
                QaFlag::LowVisible,
                QaFlag::LowNdsi,
                QaFlag::ProbableCloud,
                QaFlag::ProbablyClear,
            ]),
            optional_flag_clear: FlagSet::empty(),
            screen_optional: false,
        }
    }

    /// A user-defined tier.
    pub fn custom(
        basic_qa_max: u8,
        required_flag_clear: FlagSet,
        optional_flag_clear: FlagSet,
        screen_optional: bool,
    ) -> Self {
        Self {
            name: TierName::Custom,
            basic_qa_max,
            required_flag_clear,
            optional_flag_clear,
            screen_optional,
        }
    }

    /// Preset for a named tier. `Custom` has no preset.
    pub fn preset(name: TierName) -> Result<Self> {
        match name {
            TierName::Strict => Ok(Self::strict()),
            TierName::Balanced => Ok(Self::balanced()),
            TierName::Relaxed => Ok(Self::relaxed()),
            TierName::Custom => Err(QualityError::MissingCustomSpec),
        }
    }

    /// Resolve a tier from configuration values.
    pub fn resolve(name: &str, custom: Option<&CustomTierSpec>) -> Result<Self> {
        match name.parse::<TierName>()? {
            TierName::Custom => custom.ok_or(QualityError::MissingCustomSpec)?.to_tier(),
            preset => Self::preset(preset),
        }
    }

    /// Turn the optional screens on or off.
    pub fn with_optional_screens(mut self, enabled: bool) -> Self {
        self.screen_optional = enabled;
        self
    }

    pub fn name(&self) -> TierName {
        self.name
    }

    pub fn basic_qa_max(&self) -> u8 {
        self.basic_qa_max
    }

    pub fn required_flags(&self) -> FlagSet {
        self.required_flag_clear
    }

    pub fn optional_flags(&self) -> FlagSet {
        self.optional_flag_clear
    }

    pub fn screens_optional(&self) -> bool {
        self.screen_optional
    }

    /// Flags actually checked against the flag band.
    pub fn effective_flags(&self) -> FlagSet {
        if self.screen_optional {
            self.required_flag_clear.union(&self.optional_flag_clear)
        } else {
            self.required_flag_clear
        }
    }

    /// Whether the tier needs the algorithm flag band at all.
    pub fn uses_flags(&self) -> bool {
        !self.effective_flags().is_empty()
    }

    /// Structural monotonicity check: every cell this tier accepts is also
    /// accepted by `other`.
    pub fn is_stricter_or_equal(&self, other: &QualityTier) -> bool {
        self.basic_qa_max <= other.basic_qa_max
            && self.effective_flags().is_superset(&other.effective_flags())
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (basic QA <= {}, flags {})",
            self.name,
            self.basic_qa_max,
            self.effective_flags()
        )
    }
}

/// Configuration block for the custom tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTierSpec {
    #[serde(default = "default_basic_qa_max")]
    pub basic_qa_max: u8,
    /// Names of flags that must be clear.
    #[serde(default)]
    pub flags: Vec<String>,
    /// Names of flags checked only with `screen_optional`.
    #[serde(default)]
    pub optional_flags: Vec<String>,
    #[serde(default)]
    pub screen_optional: bool,
}

fn default_basic_qa_max() -> u8 {
    1
}

impl CustomTierSpec {
    /// Build the tier, rejecting unknown flag names.
    pub fn to_tier(&self) -> Result<QualityTier> {
        Ok(QualityTier::custom(
            self.basic_qa_max,
            FlagSet::from_names(&self.flags)?,
            FlagSet::from_names(&self.optional_flags)?,
            self.screen_optional,
        ))
    }
}
