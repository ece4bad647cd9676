//! Core data model for the kinefit pipeline.
//!
//! Rigid transforms, joint arenas and skeletons, pose snapshots, keyframed
//! motions, measurement units and the pipeline configuration live here; the
//! codec, marker, anthropometric, fitting and dynamics crates all build on
//! these types.

pub mod config;
pub mod error;
pub mod joint;
pub mod motion;
pub mod pose;
pub mod rotation;
pub mod skeleton;
pub mod transform;
pub mod units;

pub use config::{FitConfig, MarkerConfig, SolveConfig, SubjectConfig};
pub use error::ConfigError;
pub use joint::{ChannelSet, Joint};
pub use motion::{Interpolation, Motion, DEFAULT_FRAME_RATE};
pub use pose::Pose;
pub use rotation::RotationOrder;
pub use skeleton::Skeleton;
pub use transform::Transform;
pub use units::{LengthUnit, WeightUnit};
