//! Finite-difference velocity and acceleration estimation.
//!
//! Both estimators run the five-point central stencil `(1, -8, 0, 8, -1)`
//! over `12 * dt`, once over the samples and a second time over the stored
//! first derivatives. They differ at the track ends: position windows wrap
//! circularly onto the opposite end, rotation windows clamp to the boundary
//! keys.

use nalgebra::{Quaternion, UnitQuaternion, Vector3};

/// Five-point central difference weights, denominator `12 * dt`.
const STENCIL: [f32; 5] = [1.0, -8.0, 0.0, 8.0, -1.0];

/// First and second derivative tracks, one entry per input sample.
#[derive(Debug, Clone, Default)]
pub struct Rates {
    pub velocities: Vec<Vector3<f32>>,
    pub accelerations: Vec<Vector3<f32>>,
}

// ---------------------------------------------------------------------------
// Linear rates
// ---------------------------------------------------------------------------

/// Velocity and acceleration of a position track sampled every `dt` seconds.
///
/// A single-sample track has one zero entry per quantity; an empty track
/// stays empty.
#[must_use]
pub fn linear_rates(positions: &[Vector3<f32>], dt: f32) -> Rates {
    if positions.is_empty() {
        return Rates::default();
    }
    if positions.len() == 1 {
        return Rates {
            velocities: vec![Vector3::zeros()],
            accelerations: vec![Vector3::zeros()],
        };
    }
    let velocities = circular_stencil(positions, dt);
    let accelerations = circular_stencil(&velocities, dt);
    Rates {
        velocities,
        accelerations,
    }
}

fn circular_stencil(samples: &[Vector3<f32>], dt: f32) -> Vec<Vector3<f32>> {
    let n = samples.len();
    let scale = 1.0 / (12.0 * dt);
    (0..n)
        .map(|center| {
            let mut sum = Vector3::zeros();
            for (tap, weight) in STENCIL.iter().enumerate() {
                sum += samples[wrap_index(center, tap, n)] * *weight;
            }
            sum * scale
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Angular rates
// ---------------------------------------------------------------------------

/// Angular velocity and acceleration of a rotation track sampled every `dt`
/// seconds, in radians per second in the rotation's local frame.
///
/// Window neighbours are flipped onto the hemisphere of the centre key
/// before differencing, so stored quaternion sign changes do not read as
/// motion. Rates come from the quaternion kinematics identities
/// `w = 2 * Im(conj(q) * dq)` and `a = 2 * Im(conj(q) * ddq)`.
///
/// A single-sample track has one zero entry per quantity; an empty track
/// stays empty.
#[must_use]
pub fn angular_rates(track: &[UnitQuaternion<f32>], dt: f32) -> Rates {
    if track.is_empty() {
        return Rates::default();
    }
    if track.len() == 1 {
        return Rates {
            velocities: vec![Vector3::zeros()],
            accelerations: vec![Vector3::zeros()],
        };
    }
    let n = track.len();
    let scale = 1.0 / (12.0 * dt);

    let mut first = Vec::with_capacity(n);
    for center in 0..n {
        let pivot = track[center];
        let mut dq = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        for (tap, weight) in STENCIL.iter().enumerate() {
            let neighbour = track[clamp_index(center, tap, n)];
            let aligned = if pivot.coords.dot(&neighbour.coords) < 0.0 {
                -neighbour.into_inner()
            } else {
                neighbour.into_inner()
            };
            dq += aligned * *weight;
        }
        first.push(dq * scale);
    }

    // The second pass runs over the stored derivatives as-is; they already
    // carry their centre key's sign.
    let mut velocities = Vec::with_capacity(n);
    let mut accelerations = Vec::with_capacity(n);
    for center in 0..n {
        let mut ddq = Quaternion::new(0.0, 0.0, 0.0, 0.0);
        for (tap, weight) in STENCIL.iter().enumerate() {
            ddq += first[clamp_index(center, tap, n)] * *weight;
        }
        velocities.push(body_rate(track[center], &first[center]));
        accelerations.push(body_rate(track[center], &(ddq * scale)));
    }
    Rates {
        velocities,
        accelerations,
    }
}

/// Body-frame rate vector `2 * Im(conj(q) * dq)`.
fn body_rate(center: UnitQuaternion<f32>, derivative: &Quaternion<f32>) -> Vector3<f32> {
    (center.into_inner().conjugate() * *derivative).imag() * 2.0
}

// ---------------------------------------------------------------------------
// Window indexing
// ---------------------------------------------------------------------------

/// Window index `center - 2 + tap` wrapped into `[0, n)`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn wrap_index(center: usize, tap: usize, n: usize) -> usize {
    let idx = center as isize + tap as isize - 2;
    idx.rem_euclid(n as isize) as usize
}

/// Window index `center - 2 + tap` clamped into `[0, n)`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn clamp_index(center: usize, tap: usize, n: usize) -> usize {
    let idx = center as isize + tap as isize - 2;
    idx.clamp(0, n as isize - 1) as usize
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn spin_y(angle: f32) -> UnitQuaternion<f32> {
        UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle)
    }

    // ---- linear ----

    #[test]
    fn constant_positions_have_zero_rates() {
        let track = vec![Vector3::new(3.0, -1.0, 2.0); 6];
        let rates = linear_rates(&track, 0.1);
        assert_eq!(rates.velocities.len(), 6);
        for v in rates.velocities.iter().chain(&rates.accelerations) {
            assert_relative_eq!(*v, Vector3::zeros(), epsilon = 1.0e-6);
        }
    }

    #[test]
    fn ramp_velocity_is_exact_inside_and_wraps_at_the_edges() {
        let track: Vec<Vector3<f32>> = (0..6)
            .map(|k| Vector3::new(k as f32, 0.0, 0.0))
            .collect();
        let rates = linear_rates(&track, 1.0);
        for center in 2..4 {
            assert_relative_eq!(rates.velocities[center].x, 1.0, epsilon = 1.0e-5);
        }
        // Frame 0 borrows frames 4 and 5 through the wrap:
        // (p4 - 8 p5 + 8 p1 - p2) / 12 = (4 - 40 + 8 - 2) / 12.
        assert_relative_eq!(rates.velocities[0].x, -2.5, epsilon = 1.0e-5);
    }

    #[test]
    fn quadratic_positions_recover_linear_velocity_and_constant_acceleration() {
        let track: Vec<Vector3<f32>> = (0..11)
            .map(|k| Vector3::new((k * k) as f32, 0.0, 0.0))
            .collect();
        let rates = linear_rates(&track, 1.0);
        assert_relative_eq!(rates.velocities[5].x, 10.0, epsilon = 1.0e-4);
        assert_relative_eq!(rates.accelerations[5].x, 2.0, epsilon = 1.0e-4);
    }

    #[test]
    fn single_position_yields_one_zero_entry() {
        let rates = linear_rates(&[Vector3::new(7.0, 0.0, 0.0)], 0.5);
        assert_eq!(rates.velocities, vec![Vector3::zeros()]);
        assert_eq!(rates.accelerations, vec![Vector3::zeros()]);
    }

    #[test]
    fn empty_position_track_stays_empty() {
        let rates = linear_rates(&[], 0.5);
        assert!(rates.velocities.is_empty());
        assert!(rates.accelerations.is_empty());
    }

    // ---- angular ----

    #[test]
    fn constant_spin_recovers_the_axis_rate() {
        let track: Vec<UnitQuaternion<f32>> =
            (0..12).map(|k| spin_y(0.1 * k as f32)).collect();
        let rates = angular_rates(&track, 1.0);
        for center in 2..10 {
            assert_relative_eq!(
                rates.velocities[center],
                Vector3::new(0.0, 0.1, 0.0),
                epsilon = 1.0e-4
            );
        }
        // Accelerations need the second-pass window clear of the clamped
        // boundary derivatives, which reaches two keys further in.
        for center in 4..8 {
            assert_relative_eq!(
                rates.accelerations[center],
                Vector3::zeros(),
                epsilon = 1.0e-3
            );
        }
    }

    #[test]
    fn clamped_window_halves_the_edge_velocity() {
        // A clamped window repeats the boundary key, so a steady spin reads
        // at half rate on the first frame.
        let track: Vec<UnitQuaternion<f32>> =
            (0..12).map(|k| spin_y(0.1 * k as f32)).collect();
        let rates = angular_rates(&track, 1.0);
        assert_relative_eq!(rates.velocities[0].y, 0.05, epsilon = 1.0e-4);
    }

    #[test]
    fn hemisphere_flips_do_not_change_velocities() {
        let plain: Vec<UnitQuaternion<f32>> =
            (0..8).map(|k| spin_y(0.15 * k as f32)).collect();
        let flipped: Vec<UnitQuaternion<f32>> = plain
            .iter()
            .enumerate()
            .map(|(k, q)| {
                if k % 2 == 1 {
                    UnitQuaternion::new_unchecked(-q.into_inner())
                } else {
                    *q
                }
            })
            .collect();

        let a = angular_rates(&plain, 1.0 / 30.0);
        let b = angular_rates(&flipped, 1.0 / 30.0);
        // Only the velocities are flip-invariant: the stored derivatives
        // keep their centre key's sign, so the second pass mixes signs.
        for (va, vb) in a.velocities.iter().zip(&b.velocities) {
            assert_relative_eq!(*va, *vb, epsilon = 1.0e-5);
        }
    }

    #[test]
    fn identity_track_has_zero_angular_rates() {
        let track = vec![UnitQuaternion::identity(); 5];
        let rates = angular_rates(&track, 0.02);
        for v in rates.velocities.iter().chain(&rates.accelerations) {
            assert_relative_eq!(*v, Vector3::zeros(), epsilon = 1.0e-6);
        }
    }

    #[test]
    fn single_rotation_yields_one_zero_entry() {
        let rates = angular_rates(&[spin_y(0.4)], 0.5);
        assert_eq!(rates.velocities, vec![Vector3::zeros()]);
        assert_eq!(rates.accelerations, vec![Vector3::zeros()]);
    }

    #[test]
    fn empty_rotation_track_stays_empty() {
        let rates = angular_rates(&[], 0.5);
        assert!(rates.velocities.is_empty());
        assert!(rates.accelerations.is_empty());
    }
}
