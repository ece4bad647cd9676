//! Scale-rotation-translation transforms for skeleton kinematics.

use std::ops::Mul;

use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// A spatial mapping applied as componentwise scale, then rotation, then
/// translation.
///
/// Composition chains parent-to-child: `(a * b).transform_point(p)` equals
/// `a.transform_point(b.transform_point(p))`. Composition is associative but
/// not commutative. The componentwise law is exact when the left operand's
/// scale commutes with the right operand's rotation; uniform scale always
/// does, and capture skeletons keep scale at one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: UnitQuaternion<f32>,
    pub translation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Transform {
    /// The identity transform.
    #[must_use]
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
            scale: Vector3::repeat(1.0),
        }
    }

    /// Build a transform from its three parts.
    #[must_use]
    pub fn from_parts(
        rotation: UnitQuaternion<f32>,
        translation: Vector3<f32>,
        scale: Vector3<f32>,
    ) -> Self {
        Self {
            rotation,
            translation,
            scale,
        }
    }

    /// A pure rotation.
    #[must_use]
    pub fn from_rotation(rotation: UnitQuaternion<f32>) -> Self {
        Self {
            rotation,
            ..Self::identity()
        }
    }

    /// A pure translation.
    #[must_use]
    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self {
            translation,
            ..Self::identity()
        }
    }

    /// A pure componentwise scale.
    #[must_use]
    pub fn from_scale(scale: Vector3<f32>) -> Self {
        Self {
            scale,
            ..Self::identity()
        }
    }

    /// Map a point through scale, rotation, and translation.
    #[must_use]
    pub fn transform_point(&self, point: Point3<f32>) -> Point3<f32> {
        Point3::from(self.rotation * self.scale.component_mul(&point.coords) + self.translation)
    }

    /// Map a direction through scale and rotation only.
    #[must_use]
    pub fn transform_vector(&self, dir: Vector3<f32>) -> Vector3<f32> {
        self.rotation * self.scale.component_mul(&dir)
    }

    /// The inverse mapping. `t * t.inverse()` is the identity for any
    /// nonzero scale; the reverse product needs the commutation noted on
    /// [`Transform`].
    #[must_use]
    pub fn inverse(&self) -> Self {
        let inv_rotation = self.rotation.inverse();
        let inv_scale = Vector3::new(1.0 / self.scale.x, 1.0 / self.scale.y, 1.0 / self.scale.z);
        let translation = -inv_scale.component_mul(&(inv_rotation * self.translation));
        Self {
            rotation: inv_rotation,
            translation,
            scale: inv_scale,
        }
    }

    /// The equivalent homogeneous matrix (translation * rotation * scale).
    #[must_use]
    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Matrix4::new_nonuniform_scaling(&self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mul for Transform {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self {
            rotation: self.rotation * rhs.rotation,
            translation: self.translation
                + self.rotation * self.scale.component_mul(&rhs.translation),
            scale: self.scale.component_mul(&rhs.scale),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
