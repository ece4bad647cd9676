//! Whole-body mass model.
//!
//! [`BodyModel`] measures a skeleton in its rest pose, estimates the
//! subject's stature and weight when they are not given, and distributes
//! segment masses over the skeleton's bones through a [`SegmentMapping`].

use std::collections::HashMap;

use nalgebra::{UnitQuaternion, Vector3};
use tracing::warn;

use kinefit_core::Skeleton;

use crate::mapping::SegmentMapping;
use crate::segment::{body_density, weight_from_height};

// ---------------------------------------------------------------------------
// Skeleton measurement
// ---------------------------------------------------------------------------

/// Deep copy of `skeleton` posed at rest with the root at the origin and
/// every bone offset scaled by `factor`.
///
/// `factor` converts the skeleton's length unit to meters, for example
/// `0.01` for a rig authored in centimeters.
#[must_use]
pub fn rest_copy(skeleton: &Skeleton, factor: f32) -> Skeleton {
    let mut copy = skeleton.clone();
    for joint in copy.joints_mut() {
        joint.local_mut().rotation = UnitQuaternion::identity();
        joint.local_mut().translation *= factor;
    }
    if let Some(root) = copy.joints_mut().next() {
        root.local_mut().translation = Vector3::zeros();
    }
    copy.update_global_transforms();
    copy
}

/// Bounding extents of the current global joint positions.
///
/// The root sits at an arbitrary capture-space position, so the sweep starts
/// at its first child. Skeletons with fewer than two joints have zero
/// extents.
#[must_use]
pub fn bounding_extents(skeleton: &Skeleton) -> Vector3<f32> {
    let mut min = Vector3::repeat(f32::MAX);
    let mut max = Vector3::repeat(f32::MIN);
    let mut seen = false;
    for joint in skeleton.joints().iter().skip(1) {
        let pos = joint.global().translation;
        min = min.inf(&pos);
        max = max.sup(&pos);
        seen = true;
    }
    if seen {
        max - min
    } else {
        Vector3::zeros()
    }
}

/// Index of the vertical axis, 1 for Y-up rigs and 2 for Z-up rigs.
#[must_use]
pub fn vertical_axis(skeleton: &Skeleton) -> usize {
    let dim = bounding_extents(skeleton);
    if dim.y > dim.z {
        1
    } else {
        2
    }
}

/// Estimates stature as the vertical span from the head end effector down to
/// a heel, toe or foot joint.
///
/// When either landmark is missing the estimate degrades to the vertical
/// extent over all joints, root included.
#[must_use]
pub fn estimate_height(skeleton: &Skeleton, up_axis: usize) -> f32 {
    let head = skeleton.find_end_effector("Head");
    let foot = skeleton.find_joint_any(&["Heel", "Toe", "Foot"]);
    if let (Some(head), Some(foot)) = (head, foot) {
        return skeleton.joint(head).global().translation[up_axis]
            - skeleton.joint(foot).global().translation[up_axis];
    }

    warn!(
        head = head.is_some(),
        foot = foot.is_some(),
        "head or foot landmark not found, estimating stature from joint extents"
    );
    let mut min = f32::MAX;
    let mut max = f32::MIN;
    for joint in skeleton.joints() {
        let v = joint.global().translation[up_axis];
        min = min.min(v);
        max = max.max(v);
    }
    if max > min {
        max - min
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// BoneShape
// ---------------------------------------------------------------------------

/// Mass properties of the bone ending at one joint.
///
/// The bone runs from the joint's parent to the joint, so `length` is the
/// norm of the joint's rest offset in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneShape {
    /// Mass in kilograms.
    pub mass: f32,
    /// Density in g/cm3.
    pub density: f32,
    /// Half-width of the cuboid bone volume in meters.
    pub radius: f32,
    /// Center of mass position along the bone as a fraction from the
    /// proximal end.
    pub com_fraction: f32,
    /// Radius of gyration about the proximal end as a fraction of length.
    pub gyration_fraction: f32,
    /// Bone length in meters.
    pub length: f32,
}

// ---------------------------------------------------------------------------
// BodyModel
// ---------------------------------------------------------------------------

/// Anthropometric mass distribution over a skeleton.
#[derive(Debug, Clone)]
pub struct BodyModel {
    skeleton: Skeleton,
    mapping: SegmentMapping,
    height: f32,
    weight: f32,
    body_density: f32,
    skeletal_mass: f32,
    shapes: HashMap<String, BoneShape>,
}

impl BodyModel {
    /// Builds the model, estimating stature from the rig and weight from
    /// stature.
    #[must_use]
    pub fn from_skeleton(skeleton: &Skeleton, mapping: SegmentMapping, factor: f32) -> Self {
        let scaled = rest_copy(skeleton, factor);
        let up = vertical_axis(&scaled);
        let height = estimate_height(&scaled, up);
        let weight = weight_from_height(height);
        Self::build(scaled, mapping, height, weight)
    }

    /// Builds the model from measured subject stature (meters) and weight
    /// (kilograms).
    #[must_use]
    pub fn with_subject(
        skeleton: &Skeleton,
        mapping: SegmentMapping,
        height: f32,
        weight: f32,
        factor: f32,
    ) -> Self {
        let scaled = rest_copy(skeleton, factor);
        Self::build(scaled, mapping, height, weight)
    }

    fn build(skeleton: Skeleton, mapping: SegmentMapping, height: f32, weight: f32) -> Self {
        let density = body_density(height, weight);
        let mut shapes = HashMap::with_capacity(skeleton.joint_count());
        let mut skeletal_mass = 0.0;
        for joint in skeleton.joints() {
            let length = joint.local().translation.norm();
            let shape = match mapping.lookup(joint.name()) {
                Some((segment, fraction)) => {
                    let mass = segment.mass_fraction() * weight * fraction;
                    let rho = segment.density(density);
                    // Cuboid bone of volume (2r)(2r)L, density in kg/m3.
                    let denom = rho * 1000.0 * length * 4.0;
                    let radius = if denom > 0.0 && mass > 0.0 {
                        (mass / denom).sqrt()
                    } else {
                        0.0
                    };
                    BoneShape {
                        mass,
                        density: rho,
                        radius,
                        com_fraction: segment.com_proximal_fraction(),
                        gyration_fraction: segment.gyration_proximal_fraction(),
                        length,
                    }
                }
                // Joints outside the mapping carry no mass.
                None => BoneShape {
                    length,
                    ..BoneShape::default()
                },
            };
            skeletal_mass += shape.mass;
            shapes.insert(joint.name().to_string(), shape);
        }
        Self {
            skeleton,
            mapping,
            height,
            weight,
            body_density: density,
            skeletal_mass,
            shapes,
        }
    }

    /// The scaled rest-pose skeleton the model was measured on.
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// The joint naming convention in use.
    #[must_use]
    pub fn mapping(&self) -> SegmentMapping {
        self.mapping
    }

    /// Subject stature in meters.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Subject weight in kilograms.
    #[must_use]
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Overall body density in g/cm3.
    #[must_use]
    pub fn body_density(&self) -> f32 {
        self.body_density
    }

    /// Sum of all bone masses. Less than the subject weight when the
    /// mapping covers only part of the body.
    #[must_use]
    pub fn skeletal_mass(&self) -> f32 {
        self.skeletal_mass
    }

    /// Mass properties for the bone ending at `joint_name`.
    #[must_use]
    pub fn shape(&self, joint_name: &str) -> Option<&BoneShape> {
        self.shapes.get(joint_name)
    }

    /// All bone shapes keyed by joint name.
    pub fn shapes(&self) -> impl Iterator<Item = (&String, &BoneShape)> {
        self.shapes.iter()
    }

    /// Bone mass in kilograms, zero for unknown joints.
    #[must_use]
    pub fn joint_mass(&self, joint_name: &str) -> f32 {
        self.shapes.get(joint_name).map_or(0.0, |s| s.mass)
    }

    /// Bone density in g/cm3, zero for unknown joints.
    #[must_use]
    pub fn joint_density(&self, joint_name: &str) -> f32 {
        self.shapes.get(joint_name).map_or(0.0, |s| s.density)
    }

    /// Bone half-width in meters, zero for unknown joints.
    #[must_use]
    pub fn joint_radius(&self, joint_name: &str) -> f32 {
        self.shapes.get(joint_name).map_or(0.0, |s| s.radius)
    }

    /// Proximal center of mass fraction, zero for unknown joints.
    #[must_use]
    pub fn joint_com_fraction(&self, joint_name: &str) -> f32 {
        self.shapes.get(joint_name).map_or(0.0, |s| s.com_fraction)
    }

    /// Proximal radius of gyration fraction, zero for unknown joints.
    #[must_use]
    pub fn joint_gyration_fraction(&self, joint_name: &str) -> f32 {
        self.shapes.get(joint_name).map_or(0.0, |s| s.gyration_fraction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
