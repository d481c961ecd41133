//! Temporal fusion engine.
//!
//! Merges the masked Terra and Aqua frames of one date into a single
//! [`Composite`] with per-cell source attribution. Fusion is pure and
//! deterministic: identical inputs give byte-identical composites.

pub mod composite;
pub mod error;
pub mod fuse;

pub use composite::{CellSource, Composite, FusionCounters};
pub use error::{FusionError, FusionResult};
pub use fuse::{fuse, fuse_frames, select_frames};
