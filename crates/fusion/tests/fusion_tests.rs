//! Integration tests for dual-sensor fusion.

use albedo_common::{GridSpec, Sensor};
use fusion::{fuse, fuse_frames, CellSource, FusionError};
use quality_mask::{QaFlag, QualityTier};
use test_utils::{assert_approx_eq, clean_frame, gradient_codes, melt_date, scenario_grid, FrameBuilder};

fn gradient_frame(sensor: Sensor, qa_seed: usize) -> albedo_common::Frame {
    let spec = scenario_grid();
    let codes = gradient_codes(&spec);
    let mut builder = FrameBuilder::new(sensor, melt_date(), spec);
    for row in 0..spec.ny {
        for col in 0..spec.nx {
            let i = spec.flat_index(row, col);
            builder = builder
                .code_at(row, col, codes[i])
                .basic_qa_at(row, col, ((i + qa_seed) % 4) as u8);
        }
    }
    builder.build()
}

// ============================================================================
// Priority
// ============================================================================

#[test]
fn test_terra_wins_where_both_valid() {
    let terra = FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid())
        .code(40)
        .build();
    let aqua = FrameBuilder::new(Sensor::Aqua, melt_date(), scenario_grid())
        .code(90)
        .build();

    let composite = fuse(Some(&terra), Some(&aqua), &QualityTier::balanced()).unwrap();
    assert!(composite.sources.iter().all(|s| *s == CellSource::Terra));
    assert_eq!(composite.counters.both, 16);
    assert_eq!(composite.counters.aqua_only, 0);
    for value in composite.values.iter() {
        assert_approx_eq!(*value, 0.40, 1e-6);
    }
}

#[test]
fn test_aqua_fills_terra_gap() {
    // Terra invalid at (2,2), Aqua valid everywhere
    let terra = FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid())
        .invalid_at(2, 2)
        .build();
    let aqua = FrameBuilder::new(Sensor::Aqua, melt_date(), scenario_grid())
        .code(75)
        .build();

    let composite = fuse(Some(&terra), Some(&aqua), &QualityTier::balanced()).unwrap();
    let (value, source) = composite.cell(2, 2).unwrap();
    assert_eq!(source, CellSource::Aqua);
    assert_approx_eq!(value, 0.75, 1e-6);
    assert_eq!(composite.counters.aqua_only, 1);
    assert_eq!(composite.counters.both, 15);
    assert_eq!(composite.cell(1, 1).unwrap().1, CellSource::Terra);
}

#[test]
fn test_cloud_flag_in_terra_defers_to_aqua() {
    let terra = FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid())
        .flags_at(0, 3, QaFlag::ProbableCloud.mask())
        .build();
    let aqua = clean_frame(Sensor::Aqua, melt_date());

    let composite = fuse(Some(&terra), Some(&aqua), &QualityTier::relaxed()).unwrap();
    assert_eq!(composite.cell(0, 3).unwrap().1, CellSource::Aqua);
}

// ============================================================================
// Single sensor
// ============================================================================

#[test]
fn test_single_sensor_uniform_attribution() {
    let aqua = FrameBuilder::new(Sensor::Aqua, melt_date(), scenario_grid())
        .invalid_at(0, 0)
        .build();
    let composite = fuse(None, Some(&aqua), &QualityTier::balanced()).unwrap();

    assert_eq!(composite.cell(0, 0), None);
    assert_eq!(composite.filled_count(), 15);
    assert!(composite
        .sources
        .iter()
        .all(|s| matches!(s, CellSource::Aqua | CellSource::None)));
    assert_eq!(composite.counters.aqua_only, 15);
    assert_eq!(composite.counters.neither, 1);
    assert_eq!(composite.masks.len(), 1);
}

// ============================================================================
// Determinism and counters
// ============================================================================

#[test]
fn test_fusion_is_deterministic() {
    let terra = gradient_frame(Sensor::Terra, 0);
    let aqua = gradient_frame(Sensor::Aqua, 2);
    let tier = QualityTier::balanced();

    let first = fuse(Some(&terra), Some(&aqua), &tier).unwrap();
    let second = fuse(Some(&terra), Some(&aqua), &tier).unwrap();
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.counters, second.counters);

    // Response order from the source must not matter either
    let reversed = fuse_frames(&[aqua.clone(), terra.clone()], &tier).unwrap();
    assert_eq!(first.fingerprint(), reversed.fingerprint());
}

#[test]
fn test_counters_partition_grid() {
    let terra = gradient_frame(Sensor::Terra, 1);
    let aqua = gradient_frame(Sensor::Aqua, 3);
    let composite = fuse(Some(&terra), Some(&aqua), &QualityTier::balanced()).unwrap();

    assert_eq!(composite.counters.total(), 16);
    assert_eq!(composite.counters.filled(), composite.filled_count());
    for (value, source) in composite.values.iter().zip(composite.sources.iter()) {
        assert_eq!(value.is_nan(), source.is_none());
    }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_grid_mismatch() {
    let terra = clean_frame(Sensor::Terra, melt_date());
    let shifted = GridSpec::new(4, 4, 500.0, 250.0, 2000.0);
    let aqua = FrameBuilder::new(Sensor::Aqua, melt_date(), shifted).build();

    assert!(matches!(
        fuse(Some(&terra), Some(&aqua), &QualityTier::balanced()),
        Err(FusionError::GridMismatch { .. })
    ));
}

#[test]
fn test_empty_response_has_no_frames() {
    assert_eq!(
        fuse_frames(&[], &QualityTier::strict()).unwrap_err(),
        FusionError::NoFrames
    );
}
