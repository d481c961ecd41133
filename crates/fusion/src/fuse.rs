//! Priority gap-fill of Terra and Aqua frames.
//!
//! Terra wins every cell where it is valid; Aqua only fills cells Terra left
//! empty. Values are never averaged across sensors: the two overpasses see
//! the surface from different view angles, and mixing them biases albedo.

use albedo_common::{Frame, Grid, Sensor};
use quality_mask::{mask, QualityTier, ValidityGrid};
use tracing::{debug, warn};

use crate::composite::{CellSource, Composite, FusionCounters};
use crate::error::{FusionError, FusionResult};

/// Fuse up to one frame per sensor into a composite.
pub fn fuse(
    terra: Option<&Frame>,
    aqua: Option<&Frame>,
    tier: &QualityTier,
) -> FusionResult<Composite> {
    for (expected, frame) in [(Sensor::Terra, terra), (Sensor::Aqua, aqua)] {
        if let Some(frame) = frame {
            if frame.sensor() != expected {
                return Err(FusionError::WrongSensor {
                    expected,
                    actual: frame.sensor(),
                });
            }
        }
    }

    match (terra, aqua) {
        (None, None) => Err(FusionError::NoFrames),
        (Some(only), None) | (None, Some(only)) => Ok(single(only, tier)),
        (Some(terra), Some(aqua)) => pair(terra, aqua, tier),
    }
}

/// Pick the first frame of each sensor out of a source response.
///
/// Extra frames for a sensor are logged and ignored.
pub fn select_frames(frames: &[Frame]) -> (Option<&Frame>, Option<&Frame>) {
    let mut terra = None;
    let mut aqua = None;
    for frame in frames {
        let slot = match frame.sensor() {
            Sensor::Terra => &mut terra,
            Sensor::Aqua => &mut aqua,
        };
        if slot.is_some() {
            warn!(
                sensor = %frame.sensor(),
                date = %frame.date(),
                "Duplicate frame for sensor, keeping the first"
            );
            continue;
        }
        *slot = Some(frame);
    }
    (terra, aqua)
}

/// Convenience wrapper: select per-sensor frames, then fuse.
pub fn fuse_frames(frames: &[Frame], tier: &QualityTier) -> FusionResult<Composite> {
    let (terra, aqua) = select_frames(frames);
    fuse(terra, aqua, tier)
}

fn scaled_values(frame: &Frame, validity: &ValidityGrid) -> Grid<f32> {
    let range = frame.product().valid_range();
    let codes = frame.reflectance();
    Grid::from_fn(codes.width(), codes.height(), |row, col| {
        match (codes.get(row, col), validity.is_valid(row, col)) {
            (Some(&code), true) => range.to_physical(code),
            _ => f32::NAN,
        }
    })
}

fn single(frame: &Frame, tier: &QualityTier) -> Composite {
    let validity = mask(frame, tier);
    let spec = *frame.spec();
    let source = CellSource::from(frame.sensor());

    let values = scaled_values(frame, &validity);
    let sources = Grid::from_fn(spec.nx, spec.ny, |row, col| {
        if validity.is_valid(row, col) {
            source
        } else {
            CellSource::None
        }
    });

    let mut counters = FusionCounters::default();
    for &valid in validity.grid.iter() {
        match (frame.sensor(), valid) {
            (Sensor::Terra, v) => counters.record(v, false),
            (Sensor::Aqua, v) => counters.record(false, v),
        }
    }

    debug!(
        date = %frame.date(),
        sensor = %frame.sensor(),
        filled = counters.filled(),
        total = counters.total(),
        "Single-sensor composite"
    );

    Composite {
        date: frame.date(),
        spec,
        tier: tier.name(),
        values,
        sources,
        counters,
        masks: vec![(frame.sensor(), validity.stats)],
    }
}

fn pair(terra: &Frame, aqua: &Frame, tier: &QualityTier) -> FusionResult<Composite> {
    if terra.spec() != aqua.spec() {
        return Err(FusionError::GridMismatch {
            terra: *terra.spec(),
            aqua: *aqua.spec(),
        });
    }
    if terra.date() != aqua.date() {
        return Err(FusionError::DateMismatch {
            terra: terra.date(),
            aqua: aqua.date(),
        });
    }

    let spec = *terra.spec();
    let terra_valid = mask(terra, tier);
    let aqua_valid = mask(aqua, tier);
    let terra_values = scaled_values(terra, &terra_valid);
    let aqua_values = scaled_values(aqua, &aqua_valid);

    let mut counters = FusionCounters::default();
    let mut sources = Grid::filled(spec.nx, spec.ny, CellSource::None);
    let mut values = Grid::filled(spec.nx, spec.ny, f32::NAN);

    // Row-major walk keeps the counters and grids independent of any hashing order.
    for row in 0..spec.ny {
        for col in 0..spec.nx {
            let t = terra_valid.is_valid(row, col);
            let a = aqua_valid.is_valid(row, col);
            counters.record(t, a);

            let chosen = if t {
                terra_values.get(row, col).map(|v| (*v, CellSource::Terra))
            } else if a {
                aqua_values.get(row, col).map(|v| (*v, CellSource::Aqua))
            } else {
                None
            };
            if let Some((value, source)) = chosen {
                values.set(row, col, value);
                sources.set(row, col, source);
            }
        }
    }

    debug!(
        date = %terra.date(),
        terra_only = counters.terra_only,
        aqua_only = counters.aqua_only,
        both = counters.both,
        neither = counters.neither,
        "Fused dual-sensor composite"
    );

    Ok(Composite {
        date: terra.date(),
        spec,
        tier: tier.name(),
        values,
        sources,
        counters,
        masks: vec![
            (Sensor::Terra, terra_valid.stats),
            (Sensor::Aqua, aqua_valid.stats),
        ],
    })
}
