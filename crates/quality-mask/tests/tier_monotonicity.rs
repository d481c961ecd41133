//! Tier ordering over the full QA input space.

use albedo_common::{Grid, GridSpec, Sensor};
use quality_mask::{mask, FlagSet, QaFlag, QualityTier};
use test_utils::{melt_date, FrameBuilder};

// ============================================================================
// Helpers
// ============================================================================

/// One row holding every combination of basic QA 0..=3 and flag byte 0..=255.
fn exhaustive_frame() -> albedo_common::Frame {
    let n = 4 * 256;
    let spec = GridSpec::new(n, 1, 500.0, 0.0, 500.0);
    let mut builder = FrameBuilder::new(Sensor::Terra, melt_date(), spec);
    for basic in 0..4u8 {
        for flags in 0..256u16 {
            let col = basic as usize * 256 + flags as usize;
            builder = builder.basic_qa_at(0, col, basic).flags_at(0, col, flags);
        }
    }
    builder.build()
}

fn is_subset(narrow: &Grid<bool>, wide: &Grid<bool>) -> bool {
    narrow
        .iter()
        .zip(wide.iter())
        .all(|(&n, &w)| !n || w)
}

// ============================================================================
// Monotonicity
// ============================================================================

#[test]
fn test_default_tiers_are_nested() {
    let frame = exhaustive_frame();
    let strict = mask(&frame, &QualityTier::strict());
    let balanced = mask(&frame, &QualityTier::balanced());
    let relaxed = mask(&frame, &QualityTier::relaxed());

    assert!(is_subset(&strict.grid, &balanced.grid));
    assert!(is_subset(&balanced.grid, &relaxed.grid));
    assert!(strict.valid_count() < balanced.valid_count());
    assert!(balanced.valid_count() < relaxed.valid_count());
}

#[test]
fn test_optional_screens_keep_nesting() {
    let frame = exhaustive_frame();
    let strict = mask(&frame, &QualityTier::strict());
    let screened = mask(&frame, &QualityTier::balanced().with_optional_screens(true));
    let balanced = mask(&frame, &QualityTier::balanced());

    assert!(is_subset(&strict.grid, &screened.grid));
    assert!(is_subset(&screened.grid, &balanced.grid));
}

#[test]
fn test_structural_order_predicts_mask_order() {
    let frame = exhaustive_frame();
    let custom_wide = QualityTier::custom(3, FlagSet::empty(), FlagSet::empty(), false);
    let custom_cloud_only =
        QualityTier::custom(2, FlagSet::empty().with(QaFlag::ProbableCloud), FlagSet::empty(), false);

    let tiers = [
        QualityTier::strict(),
        QualityTier::balanced(),
        QualityTier::relaxed(),
        custom_wide,
        custom_cloud_only,
    ];
    for a in &tiers {
        for b in &tiers {
            if a.is_stricter_or_equal(b) {
                assert!(
                    is_subset(&mask(&frame, a).grid, &mask(&frame, b).grid),
                    "{} should accept a subset of {}",
                    a,
                    b
                );
            }
        }
    }
}

// ============================================================================
// Single-cell scenario: basic QA 2
// ============================================================================

#[test]
fn test_fair_basic_qa_only_passes_relaxed() {
    let frame = FrameBuilder::new(Sensor::Terra, melt_date(), GridSpec::new(1, 1, 500.0, 0.0, 500.0))
        .basic_qa(2)
        .build();

    let strict = mask(&frame, &QualityTier::strict()).is_valid(0, 0);
    let balanced = mask(&frame, &QualityTier::balanced()).is_valid(0, 0);
    let relaxed = mask(&frame, &QualityTier::relaxed()).is_valid(0, 0);

    assert!(!strict);
    assert!(!balanced);
    assert!(relaxed);
    // accepted by a tier implies accepted by every looser tier
    assert!(!strict || balanced);
    assert!(!balanced || relaxed);
}

#[test]
fn test_out_of_range_rejected_by_every_tier() {
    let frame = FrameBuilder::new(Sensor::Aqua, melt_date(), GridSpec::new(3, 1, 500.0, 0.0, 500.0))
        .code_at(0, 0, 0)
        .code_at(0, 1, 101)
        .code_at(0, 2, 250)
        .build();
    for tier in [QualityTier::strict(), QualityTier::balanced(), QualityTier::relaxed()] {
        let result = mask(&frame, &tier);
        assert_eq!(result.valid_count(), 0);
        assert_eq!(result.stats.out_of_range, 3);
    }
}

// ============================================================================
// Single-cell scenario: low-signal and cloud-mask flags
// ============================================================================

#[test]
fn test_low_signal_and_cloud_mask_rejected_by_every_tier() {
    let flagged = [
        QaFlag::LowNdsi,
        QaFlag::LowVisible,
        QaFlag::ProbableCloud,
        QaFlag::ProbablyClear,
    ];
    let spec = GridSpec::new(flagged.len() + 1, 1, 500.0, 0.0, 500.0);
    let mut builder = FrameBuilder::new(Sensor::Terra, melt_date(), spec).basic_qa(0);
    for (col, flag) in flagged.iter().enumerate() {
        builder = builder.flags_at(0, col, flag.mask());
    }
    let frame = builder.build();

    for tier in [QualityTier::strict(), QualityTier::balanced(), QualityTier::relaxed()] {
        let result = mask(&frame, &tier);
        for col in 0..flagged.len() {
            assert!(!result.is_valid(0, col), "{} accepted {:?}", tier, flagged[col]);
        }
        // the unflagged control cell survives
        assert!(result.is_valid(0, flagged.len()));
        assert_eq!(result.stats.flag_rejected, flagged.len());
    }
}
