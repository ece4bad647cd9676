//! Fit-session parameters loaded from TOML.
//!
//! [`FitConfig`] gathers everything a marker-fitting run needs: subject
//! measurements, per-joint degrees of freedom, the joint-to-marker target
//! map, and the marker-sheet layout. Parsing is plain serde; `validate`
//! enforces the cross-field rules a TOML schema cannot express.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

const fn default_height() -> f32 {
    1.6002
}
const fn default_weight() -> f32 {
    67.9
}
fn default_root_marker() -> String {
    "neck".into()
}
fn default_left_wrist() -> String {
    "lwrist".into()
}
fn default_left_elbow() -> String {
    "lelbow".into()
}
fn default_right_wrist() -> String {
    "rwrist".into()
}
fn default_right_elbow() -> String {
    "relbow".into()
}
fn default_recenter() -> String {
    "thorax".into()
}
const fn default_sigma() -> f32 {
    1.8
}
const fn default_window() -> usize {
    10
}
const fn default_vertical_offset() -> f32 {
    100.0
}

// ---------------------------------------------------------------------------
// SubjectConfig
// ---------------------------------------------------------------------------

/// Subject measurements and the skeleton definition to fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectConfig {
    /// Standing height in meters (default: 1.6002).
    #[serde(default = "default_height")]
    pub height: f32,

    /// Body weight in kilograms (default: 67.9).
    #[serde(default = "default_weight")]
    pub weight: f32,

    /// Path to the skeleton motion file.
    #[serde(default)]
    pub skeleton: PathBuf,
}

impl Default for SubjectConfig {
    fn default() -> Self {
        Self {
            height: default_height(),
            weight: default_weight(),
            skeleton: PathBuf::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// SolveConfig
// ---------------------------------------------------------------------------

/// Degrees of freedom and fitting targets.
///
/// Maps are ordered so the solver's parameter and residual layout is stable
/// across runs regardless of TOML key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveConfig {
    /// Rotational degrees of freedom per joint name (0..=3).
    #[serde(default)]
    pub dofs: BTreeMap<String, u8>,

    /// Joint name -> marker name the joint should track.
    #[serde(default)]
    pub targets: BTreeMap<String, String>,

    /// Marker seeding the root translation each frame (default: "neck").
    #[serde(default = "default_root_marker")]
    pub root_marker: String,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            dofs: BTreeMap::new(),
            targets: BTreeMap::new(),
            root_marker: default_root_marker(),
        }
    }
}

// ---------------------------------------------------------------------------
// MarkerConfig
// ---------------------------------------------------------------------------

/// Layout of the marker CSV and preprocessing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Marker name -> point index within a CSV row.
    #[serde(default)]
    pub columns: HashMap<String, usize>,

    /// Marker pairs joined when rendering the point cloud.
    #[serde(default)]
    pub connections: Vec<[String; 2]>,

    /// Calibration markers: forearm endpoints on both sides.
    #[serde(default = "default_left_wrist")]
    pub left_wrist: String,
    #[serde(default = "default_left_elbow")]
    pub left_elbow: String,
    #[serde(default = "default_right_wrist")]
    pub right_wrist: String,
    #[serde(default = "default_right_elbow")]
    pub right_elbow: String,

    /// Marker subtracted from every point during recentring (default:
    /// "thorax").
    #[serde(default = "default_recenter")]
    pub recenter: String,

    /// Gaussian smoothing sigma in frames (default: 1.8).
    #[serde(default = "default_sigma")]
    pub sigma: f32,

    /// Gaussian smoothing window in frames (default: 10).
    #[serde(default = "default_window")]
    pub window: usize,

    /// Height in centimeters added while remapping the vertical axis
    /// (default: 100).
    #[serde(default = "default_vertical_offset")]
    pub vertical_offset: f32,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            columns: HashMap::new(),
            connections: Vec::new(),
            left_wrist: default_left_wrist(),
            left_elbow: default_left_elbow(),
            right_wrist: default_right_wrist(),
            right_elbow: default_right_elbow(),
            recenter: default_recenter(),
            sigma: default_sigma(),
            window: default_window(),
            vertical_offset: default_vertical_offset(),
        }
    }
}

// ---------------------------------------------------------------------------
// FitConfig
// ---------------------------------------------------------------------------

/// Complete fit-session configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    #[serde(default)]
    pub subject: SubjectConfig,
    #[serde(default)]
    pub solve: SolveConfig,
    #[serde(default)]
    pub markers: MarkerConfig,
}

impl FitConfig {
    /// Validate cross-field rules. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subject.height <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "subject.height".into(),
                message: format!("{} (must be > 0)", self.subject.height),
            });
        }
        if self.subject.weight <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "subject.weight".into(),
                message: format!("{} (must be > 0)", self.subject.weight),
            });
        }
        for (joint, &dof) in &self.solve.dofs {
            if dof > 3 {
                return Err(ConfigError::InvalidValue {
                    field: format!("solve.dofs.{joint}"),
                    message: format!("{dof} (must be 0..=3)"),
                });
            }
        }
        if self.solve.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        for (joint, marker) in &self.solve.targets {
            if !self.markers.columns.contains_key(marker) {
                return Err(ConfigError::TargetWithoutColumn {
                    joint: joint.clone(),
                    marker: marker.clone(),
                });
            }
        }
        if !self.markers.columns.contains_key(&self.solve.root_marker) {
            return Err(ConfigError::InvalidValue {
                field: "solve.root_marker".into(),
                message: format!("{} has no marker column", self.solve.root_marker),
            });
        }
        if self.markers.sigma <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "markers.sigma".into(),
                message: format!("{} (must be > 0)", self.markers.sigma),
            });
        }
        if self.markers.window == 0 {
            return Err(ConfigError::InvalidValue {
                field: "markers.window".into(),
                message: "0 (must be >= 1)".into(),
            });
        }
        Ok(())
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file and validate.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Motion-file path written next to the capture CSV.
    #[must_use]
    pub fn motion_output_path(capture: impl AsRef<Path>) -> PathBuf {
        capture.as_ref().with_extension("bvh")
    }

    /// Postprocessed marker CSV path written next to the capture CSV.
    #[must_use]
    pub fn postprocessed_output_path(capture: impl AsRef<Path>) -> PathBuf {
        let capture = capture.as_ref();
        let stem = capture
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().into_owned());
        capture.with_file_name(format!("{stem}-postprocess.csv"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
