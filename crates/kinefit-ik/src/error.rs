//! Error types for marker fitting.

use thiserror::Error;

use kinefit_bvh::BvhError;
use kinefit_core::ConfigError;
use kinefit_markers::MarkerError;

/// Errors surfaced while fitting a skeleton to a marker capture.
#[derive(Debug, Error)]
pub enum FitError {
    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing a motion file failed.
    #[error("Motion file error: {0}")]
    Motion(#[from] BvhError),

    /// Loading, filtering or calibrating marker data failed.
    #[error("Marker data error: {0}")]
    Marker(#[from] MarkerError),

    /// A configured joint name is absent from the skeleton.
    #[error("skeleton has no joint named {0}")]
    UnknownJoint(String),

    /// A marker column index exceeds the points available in a frame.
    #[error("marker column {column} out of range for a frame with {channels} points")]
    ColumnOutOfRange { column: usize, channels: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
