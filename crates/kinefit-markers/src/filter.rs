//! Temporal smoothing of marker trajectories.

use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Gaussian filter
// ---------------------------------------------------------------------------

/// Smooths each marker channel across frames with a discrete Gaussian
/// kernel.
///
/// The window is clamped at the sequence boundaries, replicating the edge
/// frames rather than wrapping around. Frames must share a channel count,
/// which [`load_points`](crate::io::load_points) guarantees. A zero window
/// or an empty sequence passes through unchanged; `sigma` must be positive.
#[must_use]
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn gaussian_filter(
    points: &[Vec<Vector3<f32>>],
    sigma: f32,
    window: usize,
) -> Vec<Vec<Vector3<f32>>> {
    if points.is_empty() || window == 0 {
        return points.to_vec();
    }

    let weights = kernel(sigma, window);
    let half = (window / 2) as isize;
    let frame_count = points.len();
    let channels = points[0].len();

    let mut result = points.to_vec();
    for channel in 0..channels {
        for frame in 0..frame_count {
            let mut average = Vector3::zeros();
            for (k, weight) in weights.iter().enumerate() {
                let id = (frame as isize + k as isize - half)
                    .clamp(0, frame_count as isize - 1) as usize;
                average += *weight * points[id][channel];
            }
            result[frame][channel] = average;
        }
    }
    result
}

#[allow(clippy::cast_precision_loss)]
fn kernel(sigma: f32, window: usize) -> Vec<f32> {
    let mu = (window / 2) as f32;
    let norm = sigma * (2.0 * std::f32::consts::PI).sqrt();
    let mut weights: Vec<f32> = (0..window)
        .map(|i| (-(i as f32 - mu).powi(2) / (2.0 * sigma * sigma)).exp() / norm)
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant_frames(count: usize, value: Vector3<f32>) -> Vec<Vec<Vector3<f32>>> {
        vec![vec![value, value * 2.0]; count]
    }

    #[test]
    fn constant_sequence_is_unchanged() {
        let points = constant_frames(6, Vector3::new(1.0, -2.0, 3.0));
        let smoothed = gaussian_filter(&points, 1.8, 10);
        for (frame, original) in smoothed.iter().zip(&points) {
            for (p, q) in frame.iter().zip(original) {
                assert_relative_eq!(*p, *q, epsilon = 1.0e-5);
            }
        }
    }

    #[test]
    fn single_frame_is_unchanged() {
        let points = constant_frames(1, Vector3::new(0.5, 0.5, 0.0));
        let smoothed = gaussian_filter(&points, 1.8, 10);
        assert_relative_eq!(smoothed[0][0], points[0][0], epsilon = 1.0e-6);
        assert_relative_eq!(smoothed[0][1], points[0][1], epsilon = 1.0e-6);
    }

    #[test]
    fn zero_window_passes_through() {
        let points = constant_frames(4, Vector3::new(2.0, 0.0, 0.0));
        assert_eq!(gaussian_filter(&points, 1.8, 0), points);
    }

    #[test]
    fn empty_sequence_stays_empty() {
        assert!(gaussian_filter(&[], 1.8, 10).is_empty());
    }

    #[test]
    fn boundary_clamps_instead_of_wrapping() {
        // A spike in the last frame must not leak into the start, which a
        // circular window would cause.
        let mut points = vec![vec![Vector3::zeros()]; 12];
        points[11][0] = Vector3::new(12.0, 0.0, 0.0);
        let smoothed = gaussian_filter(&points, 1.8, 10);

        assert_eq!(smoothed[0][0], Vector3::zeros());
        assert!(smoothed[11][0].x > 0.0);
        assert!(smoothed[11][0].x < 12.0);
    }

    #[test]
    fn smoothing_spreads_a_spike() {
        let mut points = vec![vec![Vector3::zeros()]; 11];
        points[5][0] = Vector3::new(10.0, 0.0, 0.0);
        let smoothed = gaussian_filter(&points, 1.0, 3);

        assert!(smoothed[5][0].x < 10.0);
        assert!(smoothed[4][0].x > 0.0);
        assert!(smoothed[6][0].x > 0.0);
        // An odd window is symmetric about its center.
        assert_relative_eq!(smoothed[4][0].x, smoothed[6][0].x, epsilon = 1.0e-6);

        let total: f32 = smoothed.iter().map(|f| f[0].x).sum();
        assert_relative_eq!(total, 10.0, epsilon = 1.0e-4);
    }

    #[test]
    fn channels_are_filtered_independently() {
        let mut points = vec![vec![Vector3::zeros(), Vector3::zeros()]; 9];
        points[4][0] = Vector3::new(8.0, 0.0, 0.0);
        let smoothed = gaussian_filter(&points, 1.0, 3);

        assert!(smoothed[4][0].x > 0.0);
        for frame in &smoothed {
            assert_eq!(frame[1], Vector3::zeros());
        }
    }
}
