//! Euler-angle rotation orders.
//!
//! Motion files declare per-joint rotation channels in one of six axis
//! permutations. An angle triple is always stored as `(x, y, z)` components;
//! the order only controls the sequence in which the three axis rotations
//! are composed.

use nalgebra::{UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// RotationOrder
// ---------------------------------------------------------------------------

/// Application order of the three axis rotations.
///
/// `Xyz` composes `R = Rx(x) * Ry(y) * Rz(z)`, and so on for the other
/// permutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationOrder {
    #[default]
    Xyz,
    Xzy,
    Yxz,
    Yzx,
    Zxy,
    Zyx,
}

impl RotationOrder {
    /// All six orders.
    pub const ALL: [RotationOrder; 6] = [
        RotationOrder::Xyz,
        RotationOrder::Xzy,
        RotationOrder::Yxz,
        RotationOrder::Yzx,
        RotationOrder::Zxy,
        RotationOrder::Zyx,
    ];

    /// Axis indices (0 = X, 1 = Y, 2 = Z) in application order.
    #[must_use]
    pub const fn axes(self) -> [usize; 3] {
        match self {
            RotationOrder::Xyz => [0, 1, 2],
            RotationOrder::Xzy => [0, 2, 1],
            RotationOrder::Yxz => [1, 0, 2],
            RotationOrder::Yzx => [1, 2, 0],
            RotationOrder::Zxy => [2, 0, 1],
            RotationOrder::Zyx => [2, 1, 0],
        }
    }

    /// Whether the axis sequence is a cyclic permutation of X, Y, Z.
    #[must_use]
    const fn is_cyclic(self) -> bool {
        matches!(
            self,
            RotationOrder::Xyz | RotationOrder::Yzx | RotationOrder::Zxy
        )
    }

    /// Compose an `(x, y, z)` angle triple (radians) into a quaternion by
    /// applying the axis rotations in this order.
    #[must_use]
    pub fn to_quaternion(self, angles: Vector3<f32>) -> UnitQuaternion<f32> {
        let axis = |i: usize| match i {
            0 => UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.x),
            1 => UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.y),
            _ => UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angles.z),
        };
        let [a, b, c] = self.axes();
        axis(a) * axis(b) * axis(c)
    }

    /// Decompose a quaternion into an `(x, y, z)` angle triple (radians)
    /// such that [`to_quaternion`](Self::to_quaternion) reproduces the same
    /// rotation.
    ///
    /// Near gimbal lock (middle angle at ±90°) the first and third angles
    /// become coupled; the returned triple still reproduces the rotation.
    #[must_use]
    pub fn euler_angles(self, q: &UnitQuaternion<f32>) -> Vector3<f32> {
        let m = q.to_rotation_matrix();
        let [i, j, k] = self.axes();

        // For R = A(alpha) B(beta) C(gamma) the middle angle shows up at
        // m[(i, k)], with its sign and the companion atan2 terms depending
        // on the permutation parity.
        let (alpha, beta, gamma) = if self.is_cyclic() {
            (
                (-m[(j, k)]).atan2(m[(k, k)]),
                m[(i, k)].clamp(-1.0, 1.0).asin(),
                (-m[(i, j)]).atan2(m[(i, i)]),
            )
        } else {
            (
                m[(j, k)].atan2(m[(k, k)]),
                (-m[(i, k)]).clamp(-1.0, 1.0).asin(),
                m[(i, j)].atan2(m[(i, i)]),
            )
        };

        let mut angles = Vector3::zeros();
        angles[i] = alpha;
        angles[j] = beta;
        angles[k] = gamma;
        angles
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
