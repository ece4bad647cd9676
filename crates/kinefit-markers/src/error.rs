//! Error types for marker ingestion and calibration.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or calibrating marker data.
#[derive(Debug, Error)]
pub enum MarkerError {
    /// Failed to read or write the file.
    #[error("IO error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A CSV field failed to parse as a number.
    #[error("line {line}: malformed number {token}")]
    MalformedNumber { token: String, line: usize },

    /// A row's value count is not a multiple of the point stride.
    #[error("line {line}: {count} values is not a multiple of {stride}")]
    BadRow {
        line: usize,
        count: usize,
        stride: usize,
    },

    /// A row holds a different number of points than the rows before it.
    #[error("line {line}: expected {expected} points per frame, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A configured marker name has no column assignment.
    #[error("unknown marker: {0}")]
    UnknownMarker(String),

    /// A marker column lies beyond the points stored per frame.
    #[error("marker {marker} column {column} out of range for {channels} points per frame")]
    ColumnOutOfRange {
        marker: String,
        column: usize,
        channels: usize,
    },

    /// Calibration needs at least one frame of data.
    #[error("marker sequence has no frames")]
    NoFrames,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = MarkerError::MalformedNumber {
            token: "1.2.3".into(),
            line: 4,
        };
        assert_eq!(e.to_string(), "line 4: malformed number 1.2.3");

        let e = MarkerError::BadRow {
            line: 2,
            count: 7,
            stride: 3,
        };
        assert_eq!(e.to_string(), "line 2: 7 values is not a multiple of 3");

        let e = MarkerError::RaggedRow {
            line: 3,
            expected: 5,
            found: 4,
        };
        assert_eq!(
            e.to_string(),
            "line 3: expected 5 points per frame, found 4"
        );

        let e = MarkerError::UnknownMarker("thorax".into());
        assert_eq!(e.to_string(), "unknown marker: thorax");

        let e = MarkerError::ColumnOutOfRange {
            marker: "lwrist".into(),
            column: 12,
            channels: 8,
        };
        assert_eq!(
            e.to_string(),
            "marker lwrist column 12 out of range for 8 points per frame"
        );

        let e = MarkerError::NoFrames;
        assert_eq!(e.to_string(), "marker sequence has no frames");
    }

    #[test]
    fn io_error_includes_path() {
        let e = MarkerError::Io {
            path: PathBuf::from("/tmp/points.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/points.csv"));
        assert!(msg.contains("not found"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<MarkerError>();
    }
}
