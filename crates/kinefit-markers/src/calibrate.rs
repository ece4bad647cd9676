//! Scale and axis calibration of raw marker captures.
//!
//! Pose estimators emit markers in normalized image coordinates with no
//! absolute scale and a Z-up screen convention. Calibration measures the
//! median on-screen forearm length across the whole capture, scales every
//! point so the forearm matches the subject's real one, recenters the
//! capture on a reference marker's first-frame position and remaps the
//! vertical axis to Y-up.

use nalgebra::Vector3;
use tracing::debug;

use kinefit_core::MarkerConfig;

use crate::error::MarkerError;

// ---------------------------------------------------------------------------
// Calibration
// ---------------------------------------------------------------------------

/// Scales, recenters and axis-remaps a capture in place.
///
/// `forearm_length` is the subject's wrist-to-elbow distance in meters; the
/// output is in centimeters. The median over both arms and all frames keeps
/// single-frame tracking glitches from skewing the scale.
pub fn scale_markers(
    points: &mut [Vec<Vector3<f32>>],
    markers: &MarkerConfig,
    forearm_length: f32,
) -> Result<(), MarkerError> {
    if points.is_empty() {
        return Err(MarkerError::NoFrames);
    }

    let pairs = [
        (markers.left_wrist.as_str(), markers.left_elbow.as_str()),
        (markers.right_wrist.as_str(), markers.right_elbow.as_str()),
    ];
    let mut distances = Vec::with_capacity(2 * points.len());
    for frame in points.iter() {
        for (wrist, elbow) in pairs {
            let w = marker_point(frame, markers, wrist)?;
            let e = marker_point(frame, markers, elbow)?;
            distances.push((w - e).norm_squared());
        }
    }
    distances.sort_by(f32::total_cmp);
    let median = distances[distances.len() / 2].sqrt();

    // Captured units to centimeters.
    let ratio = 100.0 * forearm_length / median;
    debug!(median, ratio, "marker scale calibration");

    let origin = *marker_point(&points[0], markers, &markers.recenter)?;
    for frame in points.iter_mut() {
        for p in frame.iter_mut() {
            let scaled = ratio * (*p - origin);
            // Y-up, with the subject lifted above the ground plane.
            *p = Vector3::new(
                scaled.x,
                scaled.z + markers.vertical_offset,
                -scaled.y,
            );
        }
    }
    Ok(())
}

fn marker_point<'a>(
    frame: &'a [Vector3<f32>],
    markers: &MarkerConfig,
    name: &str,
) -> Result<&'a Vector3<f32>, MarkerError> {
    let column = *markers
        .columns
        .get(name)
        .ok_or_else(|| MarkerError::UnknownMarker(name.to_string()))?;
    frame
        .get(column)
        .ok_or_else(|| MarkerError::ColumnOutOfRange {
            marker: name.to_string(),
            column,
            channels: frame.len(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    // Column layout: thorax, lelbow, lwrist, relbow, rwrist.
    fn test_config() -> MarkerConfig {
        MarkerConfig {
            columns: HashMap::from([
                ("thorax".to_string(), 0),
                ("lelbow".to_string(), 1),
                ("lwrist".to_string(), 2),
                ("relbow".to_string(), 3),
                ("rwrist".to_string(), 4),
            ]),
            ..MarkerConfig::default()
        }
    }

    /// A frame whose forearms both measure 0.125 in capture units.
    fn nominal_frame() -> Vec<Vector3<f32>> {
        vec![
            Vector3::new(0.5, 0.5, 0.0),
            Vector3::new(0.3, 0.6, 0.2),
            Vector3::new(0.175, 0.6, 0.2),
            Vector3::new(0.7, 0.5, 0.0),
            Vector3::new(0.825, 0.5, 0.0),
        ]
    }

    #[test]
    fn scales_recenters_and_remaps_the_axes() {
        let mut points = vec![nominal_frame(), nominal_frame()];
        // Real forearm 0.25 m, on-screen 0.125: ratio 200 into centimeters.
        scale_markers(&mut points, &test_config(), 0.25).unwrap();

        // The reference marker lands at the origin, lifted by the offset.
        assert_relative_eq!(
            points[0][0],
            Vector3::new(0.0, 100.0, 0.0),
            epsilon = 1.0e-3
        );
        // lelbow: scaled (-40, 20, 40), then y <- z + 100 and z <- -y.
        assert_relative_eq!(
            points[0][1],
            Vector3::new(-40.0, 140.0, -20.0),
            epsilon = 1.0e-3
        );
        // Both frames transform identically.
        assert_relative_eq!(points[1][1], points[0][1], epsilon = 1.0e-6);
    }

    #[test]
    fn median_resists_outlier_frames() {
        let mut outlier = nominal_frame();
        // One frame with a wildly mistracked left wrist.
        outlier[2] = Vector3::new(5.0, 5.0, 5.0);
        let mut points = vec![
            nominal_frame(),
            nominal_frame(),
            nominal_frame(),
            outlier,
        ];
        scale_markers(&mut points, &test_config(), 0.25).unwrap();

        // The scale still comes out at 200, as without the outlier.
        assert_relative_eq!(
            points[0][1],
            Vector3::new(-40.0, 140.0, -20.0),
            epsilon = 1.0e-3
        );
    }

    #[test]
    fn recenter_uses_the_first_frame_only() {
        let mut moved = nominal_frame();
        moved[0] = Vector3::new(0.6, 0.5, 0.0);
        let mut points = vec![nominal_frame(), moved];
        scale_markers(&mut points, &test_config(), 0.25).unwrap();

        // Frame 1's reference marker drifted 0.1 in x: 20 cm after scaling.
        assert_relative_eq!(
            points[1][0],
            Vector3::new(20.0, 100.0, 0.0),
            epsilon = 1.0e-3
        );
    }

    #[test]
    fn unknown_marker_is_reported() {
        let mut config = test_config();
        config.columns.remove("relbow");
        let mut points = vec![nominal_frame()];
        let err = scale_markers(&mut points, &config, 0.25).unwrap_err();
        match err {
            MarkerError::UnknownMarker(name) => assert_eq!(name, "relbow"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn out_of_range_column_is_reported() {
        let mut config = test_config();
        config.columns.insert("rwrist".to_string(), 9);
        let mut points = vec![nominal_frame()];
        let err = scale_markers(&mut points, &config, 0.25).unwrap_err();
        match err {
            MarkerError::ColumnOutOfRange {
                marker,
                column,
                channels,
            } => {
                assert_eq!(marker, "rwrist");
                assert_eq!(column, 9);
                assert_eq!(channels, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_capture_is_rejected() {
        let err = scale_markers(&mut [], &test_config(), 0.25).unwrap_err();
        assert!(matches!(err, MarkerError::NoFrames));
    }
}
