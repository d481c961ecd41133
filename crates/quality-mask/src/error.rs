//! Error types for tier and flag configuration.

use thiserror::Error;

/// Errors raised while resolving quality tiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QualityError {
    /// Tier name not one of strict/balanced/relaxed/custom.
    #[error("unknown quality tier: {0}")]
    UnknownTier(String),

    /// Flag name not present in the QA flag table.
    #[error("unknown QA flag: {0}")]
    UnknownFlag(String),

    /// Bit index outside the flag table.
    #[error("QA flag bit {0} is not defined")]
    UnknownBit(u8),

    /// The custom tier was selected without its settings.
    #[error("custom quality tier requires a custom flag set")]
    MissingCustomSpec,
}

/// Result type for quality configuration.
pub type Result<T> = std::result::Result<T, QualityError>;
