//! Translation / rotation / scale transform.

use glam::{Mat4, Quat, Vec3};

/// A placement expressed as translation, rotation and (possibly non-uniform) scale.
///
/// Applied in scale, rotate, translate order, matching
/// [`Mat4::from_scale_rotation_translation`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Compose `self` (parent) with `child`, returning the combined matrix.
    ///
    /// The result is a matrix because a non-uniformly scaled parent with a
    /// rotated child is not representable as a single TRS.
    pub fn compose(&self, child: &Transform) -> Mat4 {
        self.to_matrix() * child.to_matrix()
    }

    /// Compose `self` (parent) with `child` component-wise.
    ///
    /// Exact only when the product has no shear (uniform parent scale, or a
    /// child rotation aligned with the parent's scale axes); use
    /// [`compose`](Self::compose) for the general case.
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            translation: self.to_matrix().transform_point3(child.translation),
            rotation: self.rotation * child.rotation,
            scale: self.scale * child.scale,
        }
    }

    /// Whether this transform is the identity within `epsilon`.
    pub fn is_identity(&self, epsilon: f32) -> bool {
        self.translation.abs_diff_eq(Vec3::ZERO, epsilon)
            && self.scale.abs_diff_eq(Vec3::ONE, epsilon)
            && self.rotation.abs_diff_eq(Quat::IDENTITY, epsilon)
    }
}
