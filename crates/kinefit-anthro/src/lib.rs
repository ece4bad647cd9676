//! Anthropometric tables and body mass models.
//!
//! Segment mass, center of mass and density regressions, joint-to-segment
//! mapping tables for common skeleton families, and a [`BodyModel`] that
//! distributes subject mass over a skeleton's bones.

pub mod body;
pub mod mapping;
pub mod segment;

pub use body::{bounding_extents, estimate_height, rest_copy, vertical_axis, BodyModel, BoneShape};
pub use mapping::SegmentMapping;
pub use segment::{body_density, weight_from_height, BodySegment};
