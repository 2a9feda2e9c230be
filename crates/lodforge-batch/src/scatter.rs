//! Deterministic placement generation for instanced batches.

use std::f32::consts::TAU;

use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

use crate::ScatterError;

/// Parameters for scattering copies over a square on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScatterParams {
    pub count: u32,
    /// Half side length of the square, centred on the origin.
    pub extent: f32,
    pub seed: u64,
    pub min_scale: f32,
    pub max_scale: f32,
    /// Rotate each copy by a random angle around +Y.
    pub random_yaw: bool,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            count: 100,
            extent: 50.0,
            seed: 42,
            min_scale: 1.0,
            max_scale: 1.0,
            random_yaw: true,
        }
    }
}

/// Generates `count` placements. The same parameters always yield the same
/// transforms.
///
/// The extent must be finite with a finite span, and the scales finite and
/// positive.
pub fn scatter_placements(params: &ScatterParams) -> Result<Vec<Mat4>, ScatterError> {
    let extent = params.extent.abs();
    if !(extent * 2.0).is_finite() {
        return Err(ScatterError::InvalidExtent(params.extent));
    }
    let (low, high) = if params.min_scale <= params.max_scale {
        (params.min_scale, params.max_scale)
    } else {
        (params.max_scale, params.min_scale)
    };
    if !(low > 0.0 && (high - low).is_finite()) {
        return Err(ScatterError::InvalidScale {
            min: params.min_scale,
            max: params.max_scale,
        });
    }

    let mut rng = Xoshiro256StarStar::seed_from_u64(params.seed);
    let placements = (0..params.count)
        .map(|_| {
            let x = rng.gen_range(-extent..=extent);
            let z = rng.gen_range(-extent..=extent);
            let yaw = if params.random_yaw {
                rng.gen_range(0.0..TAU)
            } else {
                0.0
            };
            let scale = if low < high { rng.gen_range(low..=high) } else { low };
            Mat4::from_scale_rotation_translation(
                Vec3::splat(scale),
                Quat::from_rotation_y(yaw),
                Vec3::new(x, 0.0, z),
            )
        })
        .collect();
    Ok(placements)
}
