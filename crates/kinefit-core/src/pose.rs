//! Skeleton pose snapshots and pose interpolation.
//!
//! A [`Pose`] is the minimal state needed to reproduce a skeleton
//! configuration: the root translation plus one local rotation per joint,
//! indexed by joint id. Interpolation blends the root linearly and the
//! rotations spherically; [`Pose::squad`] adds quaternion cubic blending
//! for smoother key sequences.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

// ---------------------------------------------------------------------------
// Quaternion helpers
// ---------------------------------------------------------------------------

/// Shortest-arc spherical interpolation.
///
/// Negates `b` when the pair straddles hemispheres so the blend never takes
/// the long way around. Falls back to a normalized linear blend when the
/// inputs are too close to antipodal for a stable slerp.
#[must_use]
pub fn slerp_shortest(
    a: &UnitQuaternion<f32>,
    b: &UnitQuaternion<f32>,
    u: f32,
) -> UnitQuaternion<f32> {
    let b = if a.coords.dot(&b.coords) < 0.0 {
        UnitQuaternion::new_unchecked(-b.into_inner())
    } else {
        *b
    };
    a.try_slerp(&b, u, 1.0e-6).unwrap_or_else(|| a.nlerp(&b, u))
}

/// Quaternion exponential of a pure (vector) quaternion.
///
/// The scalar part of the input is ignored; the vector part is read as an
/// axis-angle increment. Small angles collapse to the identity limit.
#[must_use]
pub fn quat_exp(q: &Quaternion<f32>) -> Quaternion<f32> {
    let angle = q.imag().norm();
    let (sn, cs) = angle.sin_cos();
    let coeff = if sn.abs() < 1.0e-6 { 1.0 } else { sn / angle };
    Quaternion::from_parts(cs, q.imag() * coeff)
}

/// Quaternion logarithm, the small-angle-guarded inverse of [`quat_exp`].
#[must_use]
pub fn quat_log(q: &Quaternion<f32>) -> Quaternion<f32> {
    let angle = q.imag().norm();
    let sn = angle.sin();
    let coeff = if sn.abs() < 1.0e-7 { 1.0 } else { angle / sn };
    Quaternion::from_parts(q.norm().ln(), q.imag() * coeff)
}

/// Control point for squad blending through `q1`, built from its neighbours
/// `q0` and `q2`: `exp(-1/4 * log(q2*q1^-1 + q0*q1^-1)) * q1`.
#[must_use]
pub fn squad_intermediate(
    q0: &UnitQuaternion<f32>,
    q1: &UnitQuaternion<f32>,
    q2: &UnitQuaternion<f32>,
) -> UnitQuaternion<f32> {
    let inv = q1.inverse();
    let term1 = (q2 * inv).into_inner();
    let term2 = (q0 * inv).into_inner();
    let s = quat_exp(&(quat_log(&(term1 + term2)) * -0.25));
    UnitQuaternion::new_normalize(s * q1.into_inner())
}

/// Spherical cubic blend between `q1` and `q2` with control points `s1`,
/// `s2`.
#[must_use]
pub fn squad(
    q1: &UnitQuaternion<f32>,
    q2: &UnitQuaternion<f32>,
    s1: &UnitQuaternion<f32>,
    s2: &UnitQuaternion<f32>,
    u: f32,
) -> UnitQuaternion<f32> {
    let outer = slerp_shortest(q1, q2, u);
    let inner = slerp_shortest(s1, s2, u);
    slerp_shortest(&outer, &inner, 2.0 * u * (1.0 - u))
}

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Root translation plus per-joint local rotations, indexed by joint id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    pub root_position: Vector3<f32>,
    pub rotations: Vec<UnitQuaternion<f32>>,
}

impl Pose {
    #[must_use]
    pub fn new(root_position: Vector3<f32>, rotations: Vec<UnitQuaternion<f32>>) -> Self {
        Self {
            root_position,
            rotations,
        }
    }

    /// Identity pose for `joint_count` joints.
    #[must_use]
    pub fn with_joints(joint_count: usize) -> Self {
        Self {
            root_position: Vector3::zeros(),
            rotations: vec![UnitQuaternion::identity(); joint_count],
        }
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.rotations.len()
    }

    /// Linear blend: root position lerp plus per-joint shortest-arc slerp.
    #[must_use]
    pub fn lerp(a: &Pose, b: &Pose, u: f32) -> Pose {
        debug_assert_eq!(a.rotations.len(), b.rotations.len());
        let root_position = a.root_position.lerp(&b.root_position, u);
        let rotations = a
            .rotations
            .iter()
            .zip(&b.rotations)
            .map(|(qa, qb)| slerp_shortest(qa, qb, u))
            .collect();
        Pose {
            root_position,
            rotations,
        }
    }

    /// Cubic blend between `p1` and `p2` with `p0`/`p3` as outer neighbours.
    ///
    /// The root position still blends linearly between `p1` and `p2`; each
    /// rotation takes the squad path through control points derived from the
    /// four-key window.
    #[must_use]
    pub fn squad(p0: &Pose, p1: &Pose, p2: &Pose, p3: &Pose, u: f32) -> Pose {
        debug_assert_eq!(p1.rotations.len(), p2.rotations.len());
        let root_position = p1.root_position.lerp(&p2.root_position, u);
        let rotations = p1
            .rotations
            .iter()
            .zip(&p2.rotations)
            .enumerate()
            .map(|(i, (q1, q2))| {
                let q0 = p0.rotations.get(i).unwrap_or(q1);
                let q3 = p3.rotations.get(i).unwrap_or(q2);
                let s1 = squad_intermediate(q0, q1, q2);
                let s2 = squad_intermediate(q1, q2, q3);
                squad(q1, q2, &s1, &s2, u)
            })
            .collect();
        Pose {
            root_position,
            rotations,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
