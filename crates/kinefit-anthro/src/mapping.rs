//! Joint-to-segment mapping tables.
//!
//! A mapping assigns each named joint of a known skeleton family to an
//! anthropometric [`BodySegment`] together with the fraction of that
//! segment's length the joint's bone covers. Fractions for a segment sum to
//! 1 per body side, so segment mass distributes over the bones without loss.

use serde::{Deserialize, Serialize};

use crate::segment::BodySegment;

// ---------------------------------------------------------------------------
// Mapping tables
// ---------------------------------------------------------------------------

use BodySegment::{Foot, Forearm, Hand, HeadNeck, Shank, Thigh, Trunk, UpperArm};

const MB: &[(&str, BodySegment, f32)] = &[
    ("Hips", Trunk, 0.0),
    ("LeftUpLeg", Trunk, 0.15),
    ("LeftLeg", Thigh, 1.0),
    ("LeftFoot", Shank, 1.0),
    ("LeftToeBase", Foot, 0.50),
    ("LeftToeBaseSite", Foot, 0.50),
    ("RightUpLeg", Trunk, 0.15),
    ("RightLeg", Thigh, 1.0),
    ("RightFoot", Shank, 1.0),
    ("RightToeBase", Foot, 0.50),
    ("RightToeBaseSite", Foot, 0.50),
    ("Spine", Trunk, 0.1),
    ("Spine1", Trunk, 0.2),
    ("Spine2", Trunk, 0.2),
    ("Spine3", Trunk, 0.0),
    ("Spine4", Trunk, 0.0),
    ("Neck", HeadNeck, 0.1),
    ("Head", HeadNeck, 0.1),
    ("HeadSite", HeadNeck, 0.8),
    ("LeftShoulder", Trunk, 0.05),
    ("LeftArm", Trunk, 0.05),
    ("LeftForeArm", UpperArm, 1.0),
    ("LeftHand", Forearm, 1.0),
    ("LeftHandSite", Hand, 1.0),
    ("RightShoulder", Trunk, 0.05),
    ("RightArm", Trunk, 0.05),
    ("RightForeArm", UpperArm, 1.0),
    ("RightHand", Forearm, 1.0),
    ("RightHandSite", Hand, 1.0),
];

const CMU: &[(&str, BodySegment, f32)] = &[
    ("root", Trunk, 0.0),
    ("lowerback", Trunk, 0.0),
    ("upperback", Trunk, 0.3),
    ("thorax", Trunk, 0.3),
    ("lowerneck", Trunk, 0.2),
    ("upperneck", Trunk, 0.05),
    ("head", HeadNeck, 0.2),
    ("headSite", HeadNeck, 0.75),
    ("lfemur", Thigh, 1.0),
    ("ltibia", Shank, 1.0),
    ("lfoot", Foot, 0.8),
    ("ltoes", Foot, 0.1),
    ("ltoesSite", Foot, 0.1),
    ("rfemur", Thigh, 1.0),
    ("rtibia", Shank, 1.0),
    ("rfoot", Foot, 0.8),
    ("rtoes", Foot, 0.1),
    ("rtoesSite", Foot, 0.1),
    ("lclavicle", Trunk, 0.1),
    ("lhumerus", UpperArm, 1.0),
    ("lradius", Forearm, 1.0),
    ("lwrist", Hand, 0.6),
    ("lhand", Hand, 0.2),
    ("lthumb", Hand, 0.05),
    ("lthumbSite", Hand, 0.05),
    ("lfingers", Hand, 0.05),
    ("lfingersSite", Hand, 0.05),
    ("rclavicle", Trunk, 0.1),
    ("rhumerus", UpperArm, 1.0),
    ("rradius", Forearm, 1.0),
    ("rwrist", Hand, 0.6),
    ("rhand", Hand, 0.2),
    ("rthumb", Hand, 0.05),
    ("rthumbSite", Hand, 0.05),
    ("rfingers", Hand, 0.05),
    ("rfingersSite", Hand, 0.05),
];

const ASL: &[(&str, BodySegment, f32)] = &[
    ("Hips", Trunk, 0.0),
    ("LeftUpLeg", Trunk, 0.2),
    ("LeftLeg", Thigh, 1.0),
    ("LeftFoot", Shank, 1.0),
    ("LeftFootHeel", Foot, 0.1),
    ("LeftHeelOutside", Foot, 0.1),
    ("LeftFootHeelSite", Foot, 0.4),
    ("LeftHeelOutsideSite", Foot, 0.4),
    ("RightUpLeg", Trunk, 0.2),
    ("RightLeg", Thigh, 1.0),
    ("RightFoot", Shank, 1.0),
    ("RightFootHeel", Foot, 0.1),
    ("RightHeelOutside", Foot, 0.1),
    ("RightFootHeelSite", Foot, 0.4),
    ("RightHeelOutsideSite", Foot, 0.4),
    ("Spine", Trunk, 0.15),
    ("Spine1", Trunk, 0.15),
    ("Neck", Trunk, 0.1),
    ("Head", HeadNeck, 0.2),
    ("HeadSite", HeadNeck, 0.8),
    ("LeftShoulder", Trunk, 0.05),
    ("LeftArm", Trunk, 0.05),
    ("LeftForeArm", UpperArm, 1.0),
    ("LeftHand", Forearm, 1.0),
    ("LeftmiddleA", Hand, 1.0),
    ("RightShoulder", Trunk, 0.05),
    ("RightArm", Trunk, 0.05),
    ("RightForeArm", UpperArm, 1.0),
    ("RightHand", Forearm, 1.0),
    ("RightmiddleA", Hand, 1.0),
];

const KIN: &[(&str, BodySegment, f32)] = &[
    ("spineBase", Trunk, 0.0),
    ("spineMid", Trunk, 0.55),
    ("spineShoulder", Trunk, 0.25),
    ("neck", Trunk, 0.1),
    ("head", HeadNeck, 1.0),
    ("shoulderLeft", Trunk, 0.05),
    ("elbowLeft", UpperArm, 1.0),
    ("wristLeft", Forearm, 1.0),
    ("palmLeft", Hand, 0.8),
    ("indexLeft", Hand, 0.1),
    ("thumbLeft", Hand, 0.1),
    ("shoulderRight", Trunk, 0.05),
    ("elbowRight", UpperArm, 1.0),
    ("wristRight", Forearm, 1.0),
    ("palmRight", Hand, 0.8),
    ("indexRight", Hand, 0.1),
    ("thumbRight", Hand, 0.1),
];

const NSL: &[(&str, BodySegment, f32)] = &[
    ("torso", Trunk, 1.0),
    ("neck", Trunk, 0.0),
    ("head", HeadNeck, 1.0),
    ("lshoulder", Trunk, 0.0),
    ("lelbow", UpperArm, 1.0),
    ("lwrist", Forearm, 1.0),
    ("lhand", Hand, 1.0),
    ("rshoulder", Trunk, 0.0),
    ("relbow", UpperArm, 1.0),
    ("rwrist", Forearm, 1.0),
    ("rhand", Hand, 1.0),
];

// ---------------------------------------------------------------------------
// SegmentMapping
// ---------------------------------------------------------------------------

/// Joint naming convention of a skeleton family.
///
/// Selects which table translates joint names into segment assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentMapping {
    /// Full-body skeleton with `Spine1..Spine4` and `ToeBase` joints.
    Mb,
    /// CMU motion capture database skeleton with lowercase `l`/`r` prefixes.
    Cmu,
    /// Full-body skeleton with heel markers and `middleA` finger joints.
    Asl,
    /// Upper-body depth-sensor skeleton (`spineBase`, `palmLeft`, ...).
    Kin,
    /// Minimal upper-body skeleton (`torso`, `lelbow`, ...).
    #[default]
    Nsl,
}

impl SegmentMapping {
    /// All joint entries of this mapping as `(joint name, segment, length
    /// fraction)` rows.
    #[must_use]
    pub fn entries(self) -> &'static [(&'static str, BodySegment, f32)] {
        match self {
            SegmentMapping::Mb => MB,
            SegmentMapping::Cmu => CMU,
            SegmentMapping::Asl => ASL,
            SegmentMapping::Kin => KIN,
            SegmentMapping::Nsl => NSL,
        }
    }

    /// Looks up the segment assignment for a joint name.
    ///
    /// Joint names match exactly. Returns `None` for joints the mapping does
    /// not describe; those carry no mass in the body model.
    #[must_use]
    pub fn lookup(self, joint_name: &str) -> Option<(BodySegment, f32)> {
        self.entries()
            .iter()
            .find(|(name, _, _)| *name == joint_name)
            .map(|&(_, segment, fraction)| (segment, fraction))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
