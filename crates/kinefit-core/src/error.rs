//! Error types for configuration loading and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("IK target {joint} uses marker {marker} which has no column")]
    TargetWithoutColumn { joint: String, marker: String },

    #[error("no IK targets configured")]
    NoTargets,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = ConfigError::InvalidValue {
            field: "subject.height".into(),
            message: "must be positive".into(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid value for subject.height: must be positive"
        );

        let e = ConfigError::TargetWithoutColumn {
            joint: "lwrist".into(),
            marker: "wrist_l".into(),
        };
        assert_eq!(
            e.to_string(),
            "IK target lwrist uses marker wrist_l which has no column"
        );

        let e = ConfigError::NoTargets;
        assert_eq!(e.to_string(), "no IK targets configured");
    }

    #[test]
    fn io_error_includes_path() {
        let e = ConfigError::Io {
            path: PathBuf::from("/tmp/fit.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/fit.toml"));
        assert!(msg.contains("not found"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn error_is_send_sync() {
        assert_send_sync::<ConfigError>();
    }
}
