//! Quality mask engine.
//!
//! Turns a frame's raw reflectance codes and QA bands into a boolean validity
//! grid under a selected [`QualityTier`]. A cell is valid iff:
//!
//! 1. its reflectance code lies in the product's documented valid range,
//! 2. its basic QA ordinal is at most the tier's `basic_qa_max`, and
//! 3. none of the tier's effective algorithm flags are set (only when the
//!    frame carries a flag band; otherwise this check is skipped and logged).
//!
//! Bit meanings live in one table ([`flags::QaFlag`]); tiers refer to flags by
//! name, never by raw bit masks.

pub mod error;
pub mod flags;
pub mod mask;
pub mod tier;

pub use error::{QualityError, Result};
pub use flags::{FlagSet, QaFlag};
pub use mask::{mask, MaskStats, Rejection, ValidityGrid};
pub use tier::{CustomTierSpec, QualityTier, TierName};
