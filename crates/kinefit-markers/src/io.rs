//! Marker CSV reading and writing.
//!
//! One line per frame, comma-separated floats grouped into 3D triples or 2D
//! pairs, no header row. Blank lines are skipped. Every data row must carry
//! the same number of points so that a column index addresses the same
//! marker in every frame.

use std::fmt::Write as _;
use std::path::Path;

use nalgebra::{Vector2, Vector3};
use tracing::debug;

use crate::error::MarkerError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Loads 3D marker frames from a CSV file.
pub fn load_points(path: impl AsRef<Path>) -> Result<Vec<Vec<Vector3<f32>>>, MarkerError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MarkerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_points(&text)
}

/// Parses 3D marker frames from CSV text.
pub fn parse_points(text: &str) -> Result<Vec<Vec<Vector3<f32>>>, MarkerError> {
    let frames = parse_frames(text, 3, |v| Vector3::new(v[0], v[1], v[2]))?;
    debug!(frames = frames.len(), "parsed marker frames");
    Ok(frames)
}

/// Loads 2D marker frames, for captures in normalized image coordinates.
pub fn load_points_2d(path: impl AsRef<Path>) -> Result<Vec<Vec<Vector2<f32>>>, MarkerError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| MarkerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_points_2d(&text)
}

/// Parses 2D marker frames from CSV text.
pub fn parse_points_2d(text: &str) -> Result<Vec<Vec<Vector2<f32>>>, MarkerError> {
    let frames = parse_frames(text, 2, |v| Vector2::new(v[0], v[1]))?;
    debug!(frames = frames.len(), "parsed 2D marker frames");
    Ok(frames)
}

/// Writes 3D marker frames as CSV, one frame per line.
pub fn save_points(
    path: impl AsRef<Path>,
    points: &[Vec<Vector3<f32>>],
) -> Result<(), MarkerError> {
    let path = path.as_ref();
    std::fs::write(path, points_to_string(points)).map_err(|source| MarkerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        frames = points.len(),
        "wrote marker file"
    );
    Ok(())
}

/// Serializes 3D marker frames to CSV text.
#[must_use]
pub fn points_to_string(points: &[Vec<Vector3<f32>>]) -> String {
    let mut out = String::new();
    for frame in points {
        let mut sep = "";
        for p in frame {
            let _ = write!(out, "{sep}{},{},{}", p.x, p.y, p.z);
            sep = ",";
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

fn parse_frames<T>(
    text: &str,
    stride: usize,
    build: impl Fn(&[f32]) -> T,
) -> Result<Vec<Vec<T>>, MarkerError> {
    let mut frames = Vec::new();
    let mut points_per_frame: Option<usize> = None;
    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut values = Vec::new();
        for token in trimmed.split(',') {
            let token = token.trim();
            let value = token
                .parse::<f32>()
                .map_err(|_| MarkerError::MalformedNumber {
                    token: token.to_string(),
                    line,
                })?;
            values.push(value);
        }

        if values.len() % stride != 0 {
            return Err(MarkerError::BadRow {
                line,
                count: values.len(),
                stride,
            });
        }
        let points = values.len() / stride;
        match points_per_frame {
            None => points_per_frame = Some(points),
            Some(expected) if expected != points => {
                return Err(MarkerError::RaggedRow {
                    line,
                    expected,
                    found: points,
                });
            }
            Some(_) => {}
        }

        frames.push(values.chunks_exact(stride).map(&build).collect());
    }
    Ok(frames)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- parsing ----

    #[test]
    fn parses_triples_per_frame() {
        let frames = parse_points("1,2,3,4,5,6\n7,8,9,10,11,12\n").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0][1], Vector3::new(4.0, 5.0, 6.0));
        assert_eq!(frames[1][0], Vector3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn tolerates_padding_and_blank_lines() {
        let frames = parse_points(" 1.5 , 2 , 3 \n\n  \n-4,5e-1,6\n").unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0][0], Vector3::new(1.5, 2.0, 3.0));
        assert_eq!(frames[1][0], Vector3::new(-4.0, 0.5, 6.0));
    }

    #[test]
    fn malformed_number_reports_the_line() {
        let err = parse_points("1,2,3\nx,2,3\n").unwrap_err();
        match err {
            MarkerError::MalformedNumber { token, line } => {
                assert_eq!(token, "x");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn value_count_must_be_a_multiple_of_three() {
        let err = parse_points("1,2,3,4\n").unwrap_err();
        match err {
            MarkerError::BadRow {
                line,
                count,
                stride,
            } => {
                assert_eq!(line, 1);
                assert_eq!(count, 4);
                assert_eq!(stride, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rows_must_agree_on_point_count() {
        let err = parse_points("1,2,3\n1,2,3,4,5,6\n").unwrap_err();
        match err {
            MarkerError::RaggedRow {
                line,
                expected,
                found,
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 1);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pairs_for_normalized_image_points() {
        let frames = parse_points_2d("0.5,0.5,0.25,0.75\n").unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[0][1], Vector2::new(0.25, 0.75));

        assert!(matches!(
            parse_points_2d("0.5,0.5,0.25\n"),
            Err(MarkerError::BadRow { stride: 2, .. })
        ));
    }

    #[test]
    fn empty_text_has_no_frames() {
        assert!(parse_points("").unwrap().is_empty());
        assert!(parse_points("\n\n").unwrap().is_empty());
    }

    // ---- writing ----

    #[test]
    fn serializes_one_frame_per_line() {
        let frames = vec![
            vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0)],
            vec![Vector3::new(-0.5, 0.25, 0.0), Vector3::new(7.0, 8.0, 9.0)],
        ];
        let text = points_to_string(&frames);
        assert_eq!(text, "1,2,3,4,5,6\n-0.5,0.25,0,7,8,9\n");
    }

    #[test]
    fn writing_then_parsing_is_exact() {
        let frames = vec![vec![
            Vector3::new(0.1, -2.75, 3.0e-3),
            Vector3::new(123.456, 0.0, -9.5),
        ]];
        let back = parse_points(&points_to_string(&frames)).unwrap();
        assert_eq!(back, frames);
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join("kinefit_markers_io_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("points.csv");

        let frames = vec![vec![Vector3::new(1.0, 2.0, 3.0)]];
        save_points(&path, &frames).unwrap();
        let back = load_points(&path).unwrap();
        assert_eq!(back, frames);

        // Cleanup
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_points("/nonexistent/points.csv").unwrap_err();
        assert!(matches!(err, MarkerError::Io { .. }));
    }
}
