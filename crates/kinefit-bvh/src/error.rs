//! Error types for motion file reading and writing.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing a motion file.
#[derive(Debug, Error)]
pub enum BvhError {
    /// Failed to read or write the file.
    #[error("IO error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A structural keyword was missing or out of place.
    #[error("line {line}: expected {expected}, found {found}")]
    UnexpectedToken {
        expected: String,
        found: String,
        line: usize,
    },

    /// The file ended while more content was required.
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String },

    /// A numeric field failed to parse.
    #[error("line {line}: malformed number {token}")]
    MalformedNumber { token: String, line: usize },

    /// The channel list names a rotation triple outside the six known orders.
    #[error("line {line}: unknown rotation order in channels \"{channels}\"")]
    UnknownRotationOrder { channels: String, line: usize },

    /// A joint declares a channel count other than 0, 3 or 6.
    #[error("line {line}: unsupported channel count {count}")]
    UnsupportedChannelCount { count: usize, line: usize },

    /// The frame time must be strictly positive.
    #[error("invalid frame time {0}")]
    InvalidFrameTime(f64),

    /// The motion section held fewer frames than the header declared.
    #[error("expected {expected} frames, found {found}")]
    TruncatedFrames { expected: usize, found: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
