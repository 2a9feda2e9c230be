//! Splitting affine matrices back into [`Transform`]s.
//!
//! World matrices produced by composing a hierarchy of TRS transforms are
//! usually decomposable, but a non-uniformly scaled parent with a rotated
//! child yields shear, which TRS cannot express. [`ShearPolicy`] decides what
//! happens in that case.

use glam::{Mat3, Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::{DecomposeError, Transform};

/// Largest pairwise dot product between normalised basis axes still treated as orthogonal.
pub const SHEAR_TOLERANCE: f32 = 1e-4;

/// Bottom-row tolerance for the affine check.
const AFFINE_EPSILON: f32 = 1e-6;

/// Determinant magnitude below which the basis is considered collapsed.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// What to do when a matrix contains shear.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShearPolicy {
    /// Fail with [`DecomposeError::Sheared`].
    #[default]
    Reject,
    /// Orthonormalise the basis (Gram-Schmidt) and keep the axis lengths as scale.
    BestEffort,
}

/// Decompose an affine matrix into translation, rotation and scale.
///
/// A negative determinant is folded into a negative X scale. For matrices
/// built from a single TRS the result reproduces the input within float
/// precision.
pub fn decompose(matrix: Mat4, policy: ShearPolicy) -> Result<Transform, DecomposeError> {
    if !matrix.is_finite() {
        return Err(DecomposeError::NonFinite);
    }

    let bottom = matrix.row(3);
    if !bottom.abs_diff_eq(Vec4::W, AFFINE_EPSILON) {
        return Err(DecomposeError::NonAffine {
            bottom_row: bottom.to_array(),
        });
    }

    let basis = Mat3::from_mat4(matrix);
    let determinant = basis.determinant();
    if determinant.abs() <= DEGENERATE_EPSILON {
        return Err(DecomposeError::Degenerate { determinant });
    }

    let mut scale = Vec3::new(
        basis.x_axis.length(),
        basis.y_axis.length(),
        basis.z_axis.length(),
    );
    let mut x = basis.x_axis / scale.x;
    let mut y = basis.y_axis / scale.y;
    let mut z = basis.z_axis / scale.z;

    let skew = x.dot(y).abs().max(x.dot(z).abs()).max(y.dot(z).abs());
    if skew > SHEAR_TOLERANCE {
        match policy {
            ShearPolicy::Reject => return Err(DecomposeError::Sheared { skew }),
            ShearPolicy::BestEffort => {
                tracing::warn!(skew, "dropping shear from world matrix");
                y = (y - x * x.dot(y)).normalize();
                let handed = x.cross(y);
                z = if handed.dot(z) < 0.0 { -handed } else { handed };
            }
        }
    }

    if determinant < 0.0 {
        x = -x;
        scale.x = -scale.x;
    }

    let rotation = Quat::from_mat3(&Mat3::from_cols(x, y, z)).normalize();
    let translation = matrix.w_axis.truncate();

    Ok(Transform::from_trs(translation, rotation, scale))
}
