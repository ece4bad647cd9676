//! Error types for capture dynamics assembly.

use std::path::PathBuf;

use thiserror::Error;

use kinefit_bvh::BvhError;

/// Errors that can occur while assembling or exporting capture dynamics.
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// The capture's motion file failed to load.
    #[error("Motion file error: {0}")]
    Motion(#[from] BvhError),

    /// Failed to write an export file.
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A configured end-effector name matches no joint.
    #[error("skeleton has no joint named {0}")]
    UnknownJoint(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
