//! Rigid-body quantity assembly for a captured motion.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{debug, info};

use kinefit_anthro::{BodyModel, SegmentMapping};
use kinefit_bvh::parse_file;
use kinefit_core::{Joint, LengthUnit, Motion, Skeleton};

use crate::derivatives::{angular_rates, linear_rates};
use crate::error::DynamicsError;

// ---------------------------------------------------------------------------
// SubjectParams
// ---------------------------------------------------------------------------

/// Subject measurements and capture conventions for dynamics assembly.
#[derive(Debug, Clone)]
pub struct SubjectParams {
    /// Stature in meters.
    pub height: f32,
    /// Weight in kilograms.
    pub weight: f32,
    /// Length unit the capture file is authored in.
    pub unit: LengthUnit,
    /// Joint naming convention for the body model.
    pub mapping: SegmentMapping,
    /// Left end effector tracked relative to the root.
    pub left_hand: String,
    /// Right end effector tracked relative to the root.
    pub right_hand: String,
}

impl Default for SubjectParams {
    fn default() -> Self {
        Self {
            height: 1.6002,
            weight: 67.9,
            unit: LengthUnit::Cm,
            mapping: SegmentMapping::default(),
            left_hand: "lwrist".into(),
            right_hand: "rwrist".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureDynamics
// ---------------------------------------------------------------------------

/// Per-frame kinematic quantities assembled from a capture.
///
/// Construction converts the capture to meters, poses the skeleton at the
/// first key, builds the body model from the subject measurements and runs
/// the finite-difference estimators over the root translation and every
/// joint rotation track. Global joint positions and root-relative end
/// effector trajectories are recorded frame by frame, leaving the skeleton
/// posed at the last key.
#[derive(Debug, Clone)]
pub struct CaptureDynamics {
    skeleton: Skeleton,
    motion: Motion,
    body: BodyModel,
    positions: Vec<Vec<Vector3<f32>>>,
    root_velocities: Vec<Vector3<f32>>,
    root_accelerations: Vec<Vector3<f32>>,
    joint_velocities: HashMap<String, Vec<Vector3<f32>>>,
    joint_accelerations: HashMap<String, Vec<Vector3<f32>>>,
    left_hand: Vec<Vector3<f32>>,
    right_hand: Vec<Vector3<f32>>,
}

impl CaptureDynamics {
    /// Loads a motion file and assembles its dynamics.
    pub fn from_motion_file(
        path: impl AsRef<Path>,
        subject: &SubjectParams,
    ) -> Result<Self, DynamicsError> {
        let file = parse_file(path)?;
        Self::from_motion(file.skeleton, file.motion, subject)
    }

    /// Assembles dynamics for an already loaded skeleton and pose track.
    ///
    /// # Panics
    /// Panics if the motion's keys carry a rotation count different from
    /// the skeleton's joint count.
    pub fn from_motion(
        mut skeleton: Skeleton,
        mut motion: Motion,
        subject: &SubjectParams,
    ) -> Result<Self, DynamicsError> {
        if subject.unit != LengthUnit::M {
            skeleton.convert_units(subject.unit, LengthUnit::M);
            motion.convert_units(subject.unit, LengthUnit::M);
        }
        if !motion.is_empty() {
            motion.apply_to(&mut skeleton, 0.0, false);
        }
        let body = BodyModel::with_subject(
            &skeleton,
            subject.mapping,
            subject.height,
            subject.weight,
            1.0,
        );

        #[allow(clippy::cast_possible_truncation)]
        let dt = motion.dt() as f32;

        let root_track: Vec<Vector3<f32>> =
            motion.keys().iter().map(|key| key.root_position).collect();
        let root = linear_rates(&root_track, dt);

        let mut joint_velocities = HashMap::with_capacity(skeleton.joint_count());
        let mut joint_accelerations = HashMap::with_capacity(skeleton.joint_count());
        for joint in skeleton.joints() {
            let track: Vec<UnitQuaternion<f32>> = motion
                .keys()
                .iter()
                .map(|key| key.rotations[joint.id()])
                .collect();
            let rates = angular_rates(&track, dt);
            joint_velocities.insert(joint.name().to_string(), rates.velocities);
            joint_accelerations.insert(joint.name().to_string(), rates.accelerations);
        }

        let left_id = skeleton
            .joint_index(&subject.left_hand)
            .ok_or_else(|| DynamicsError::UnknownJoint(subject.left_hand.clone()))?;
        let right_id = skeleton
            .joint_index(&subject.right_hand)
            .ok_or_else(|| DynamicsError::UnknownJoint(subject.right_hand.clone()))?;

        let mut positions = Vec::with_capacity(motion.key_count());
        let mut left_hand = Vec::with_capacity(motion.key_count());
        let mut right_hand = Vec::with_capacity(motion.key_count());
        for key in motion.keys() {
            skeleton.set_pose(key);
            let globals: Vec<Vector3<f32>> = skeleton
                .joints()
                .iter()
                .map(|joint| joint.global().translation)
                .collect();
            left_hand.push(globals[left_id] - globals[0]);
            right_hand.push(globals[right_id] - globals[0]);
            positions.push(globals);
        }

        info!(
            frames = motion.key_count(),
            joints = skeleton.joint_count(),
            "assembled capture dynamics"
        );
        Ok(Self {
            skeleton,
            motion,
            body,
            positions,
            root_velocities: root.velocities,
            root_accelerations: root.accelerations,
            joint_velocities,
            joint_accelerations,
            left_hand,
            right_hand,
        })
    }

    /// The capture's skeleton in meters, posed at the last key.
    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// The capture's pose track in meters.
    #[must_use]
    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    /// Mass distribution over the skeleton's bones.
    #[must_use]
    pub fn body(&self) -> &BodyModel {
        &self.body
    }

    /// Root linear velocity per frame, meters per second.
    #[must_use]
    pub fn root_velocities(&self) -> &[Vector3<f32>] {
        &self.root_velocities
    }

    /// Root linear acceleration per frame.
    #[must_use]
    pub fn root_accelerations(&self) -> &[Vector3<f32>] {
        &self.root_accelerations
    }

    /// Angular velocity track for a joint, by exact name.
    #[must_use]
    pub fn angular_velocities(&self, joint: &str) -> Option<&[Vector3<f32>]> {
        self.joint_velocities.get(joint).map(Vec::as_slice)
    }

    /// Angular acceleration track for a joint, by exact name.
    #[must_use]
    pub fn angular_accelerations(&self, joint: &str) -> Option<&[Vector3<f32>]> {
        self.joint_accelerations.get(joint).map(Vec::as_slice)
    }

    /// Global joint positions per frame, in joint id order.
    #[must_use]
    pub fn positions(&self) -> &[Vec<Vector3<f32>>] {
        &self.positions
    }

    /// Left end effector position relative to the root, one per frame.
    #[must_use]
    pub fn left_hand_trajectory(&self) -> &[Vector3<f32>] {
        &self.left_hand
    }

    /// Right end effector position relative to the root, one per frame.
    #[must_use]
    pub fn right_hand_trajectory(&self) -> &[Vector3<f32>] {
        &self.right_hand
    }

    /// Writes the five post-processing exports next to `prefix`.
    ///
    /// `{prefix}_vels.txt` and `{prefix}_accs.txt` carry the root linear
    /// rates under the root joint's name, `{prefix}_avels.txt` and
    /// `{prefix}_aaccs.txt` one angular-rate column triple per joint, and
    /// `{prefix}_positions.txt` the global joint positions. All files are
    /// comma-separated with a single header row.
    pub fn save(&self, prefix: impl AsRef<Path>) -> Result<(), DynamicsError> {
        let prefix = prefix.as_ref();
        let root_name = self.skeleton.root().map_or("root", Joint::name);
        let frames = self.motion.key_count();
        write_text(
            &suffixed(prefix, "_vels.txt"),
            &single_track_csv(root_name, &self.root_velocities),
        )?;
        write_text(
            &suffixed(prefix, "_accs.txt"),
            &single_track_csv(root_name, &self.root_accelerations),
        )?;
        write_text(
            &suffixed(prefix, "_avels.txt"),
            &joint_tracks_csv(&self.skeleton, frames, &self.joint_velocities),
        )?;
        write_text(
            &suffixed(prefix, "_aaccs.txt"),
            &joint_tracks_csv(&self.skeleton, frames, &self.joint_accelerations),
        )?;
        write_text(
            &suffixed(prefix, "_positions.txt"),
            &positions_csv(&self.skeleton, &self.positions),
        )?;
        info!(prefix = %prefix.display(), "wrote capture dynamics exports");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Export writers
// ---------------------------------------------------------------------------

/// `prefix` plus `suffix` as a sibling path, so `out/capture` with
/// `_vels.txt` becomes `out/capture_vels.txt`.
fn suffixed(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map_or_else(OsString::new, ToOwned::to_owned);
    name.push(suffix);
    prefix.with_file_name(name)
}

fn write_text(path: &Path, text: &str) -> Result<(), DynamicsError> {
    std::fs::write(path, text).map_err(|source| DynamicsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote dynamics export");
    Ok(())
}

fn single_track_csv(name: &str, track: &[Vector3<f32>]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{name}X,{name}Y,{name}Z");
    for v in track {
        let _ = writeln!(out, "{},{},{}", v.x, v.y, v.z);
    }
    out
}

/// One column triple per joint in id order, rows looked up by joint name.
/// Joints without a stored track write zeros.
fn joint_tracks_csv(
    skeleton: &Skeleton,
    frames: usize,
    tracks: &HashMap<String, Vec<Vector3<f32>>>,
) -> String {
    let mut out = String::new();
    let mut sep = "";
    for joint in skeleton.joints() {
        let name = joint.name();
        let _ = write!(out, "{sep}{name}X,{name}Y,{name}Z");
        sep = ",";
    }
    out.push('\n');
    for frame in 0..frames {
        let mut sep = "";
        for joint in skeleton.joints() {
            let v = tracks
                .get(joint.name())
                .and_then(|track| track.get(frame))
                .map_or_else(Vector3::zeros, |v| *v);
            let _ = write!(out, "{sep}{},{},{}", v.x, v.y, v.z);
            sep = ",";
        }
        out.push('\n');
    }
    out
}

/// The root columns are labelled `rootX,rootY,rootZ` whatever the root
/// joint is named; the remaining columns carry the joint names.
fn positions_csv(skeleton: &Skeleton, positions: &[Vec<Vector3<f32>>]) -> String {
    let mut out = String::new();
    out.push_str("rootX,rootY,rootZ");
    for joint in skeleton.joints().iter().skip(1) {
        let name = joint.name();
        let _ = write!(out, ",{name}X,{name}Y,{name}Z");
    }
    out.push('\n');
    for frame in positions {
        let mut sep = "";
        for p in frame {
            let _ = write!(out, "{sep}{},{},{}", p.x, p.y, p.z);
            sep = ",";
        }
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kinefit_core::{ChannelSet, Pose};

    fn rig() -> (Skeleton, Motion) {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_joint(Joint::new("torso"), None);
        skeleton.add_joint(
            Joint::new("lwrist")
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(0.25, 0.0, 0.0)),
            Some(root),
        );
        skeleton.add_joint(
            Joint::new("rwrist")
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(-0.25, 0.0, 0.0)),
            Some(root),
        );
        skeleton.update_global_transforms();

        let mut motion = Motion::with_frame_rate(10.0);
        for k in 0..12 {
            let mut pose = Pose::with_joints(3);
            pose.root_position = Vector3::new(0.1 * k as f32, 0.0, 0.0);
            motion.append_key(pose);
        }
        (skeleton, motion)
    }

    fn meters() -> SubjectParams {
        SubjectParams {
            unit: LengthUnit::M,
            ..SubjectParams::default()
        }
    }

    // ---- assembly ----

    #[test]
    fn root_rates_follow_the_key_translations() {
        let (skeleton, motion) = rig();
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        // 0.1 m per frame at 10 fps is 1 m/s.
        assert_relative_eq!(
            dynamics.root_velocities()[5],
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1.0e-4
        );
        assert_relative_eq!(
            dynamics.root_accelerations()[5],
            Vector3::zeros(),
            epsilon = 1.0e-3
        );
    }

    #[test]
    fn identity_rotations_have_zero_angular_rates() {
        let (skeleton, motion) = rig();
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        let velocities = dynamics.angular_velocities("lwrist").unwrap();
        assert_eq!(velocities.len(), 12);
        for v in velocities {
            assert_relative_eq!(*v, Vector3::zeros(), epsilon = 1.0e-6);
        }
        assert!(dynamics.angular_velocities("palm").is_none());
    }

    #[test]
    fn hand_trajectories_are_root_relative() {
        let (skeleton, motion) = rig();
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        assert_eq!(dynamics.left_hand_trajectory().len(), 12);
        for p in dynamics.left_hand_trajectory() {
            assert_relative_eq!(*p, Vector3::new(0.25, 0.0, 0.0), epsilon = 1.0e-5);
        }
        for p in dynamics.right_hand_trajectory() {
            assert_relative_eq!(*p, Vector3::new(-0.25, 0.0, 0.0), epsilon = 1.0e-5);
        }
    }

    #[test]
    fn positions_follow_the_pose_track() {
        let (skeleton, motion) = rig();
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        assert_eq!(dynamics.positions().len(), 12);
        assert_relative_eq!(
            dynamics.positions()[3][0],
            Vector3::new(0.3, 0.0, 0.0),
            epsilon = 1.0e-5
        );
        assert_relative_eq!(
            dynamics.positions()[3][1],
            Vector3::new(0.55, 0.0, 0.0),
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn unknown_hand_joint_is_an_error() {
        let (skeleton, motion) = rig();
        let subject = SubjectParams {
            left_hand: "palm".into(),
            ..meters()
        };
        let err = CaptureDynamics::from_motion(skeleton, motion, &subject).unwrap_err();
        assert!(matches!(err, DynamicsError::UnknownJoint(name) if name == "palm"));
    }

    #[test]
    fn centimetre_captures_convert_to_meters() {
        let mut skeleton = Skeleton::new();
        let root = skeleton.add_joint(Joint::new("torso"), None);
        skeleton.add_joint(
            Joint::new("lwrist")
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(25.0, 0.0, 0.0)),
            Some(root),
        );
        skeleton.add_joint(
            Joint::new("rwrist")
                .with_channels(ChannelSet::Rotation)
                .with_offset(Vector3::new(-25.0, 0.0, 0.0)),
            Some(root),
        );
        skeleton.update_global_transforms();
        let mut motion = Motion::with_frame_rate(10.0);
        for k in 0..12 {
            let mut pose = Pose::with_joints(3);
            pose.root_position = Vector3::new(10.0 * k as f32, 0.0, 0.0);
            motion.append_key(pose);
        }

        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &SubjectParams::default())
            .unwrap();
        assert_relative_eq!(
            dynamics.motion().key(3).unwrap().root_position,
            Vector3::new(0.3, 0.0, 0.0),
            epsilon = 1.0e-5
        );
        assert_relative_eq!(
            dynamics.root_velocities()[5],
            Vector3::new(1.0, 0.0, 0.0),
            epsilon = 1.0e-4
        );
        assert_relative_eq!(
            dynamics.left_hand_trajectory()[0],
            Vector3::new(0.25, 0.0, 0.0),
            epsilon = 1.0e-5
        );
    }

    #[test]
    fn body_model_spans_the_mapped_joints() {
        let (skeleton, motion) = rig();
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        assert!(dynamics.body().skeletal_mass() > 0.0);
        assert!(dynamics.body().joint_mass("lwrist") > 0.0);
        assert_relative_eq!(dynamics.body().weight(), 67.9, epsilon = 1.0e-6);
    }

    #[test]
    fn empty_motion_yields_empty_tracks() {
        let (skeleton, _) = rig();
        let motion = Motion::with_frame_rate(10.0);
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        assert!(dynamics.root_velocities().is_empty());
        assert!(dynamics.positions().is_empty());
        assert!(dynamics.left_hand_trajectory().is_empty());
        assert!(dynamics.angular_velocities("lwrist").unwrap().is_empty());
    }

    // ---- exports ----

    #[test]
    fn save_writes_the_five_exports() {
        let dir = std::env::temp_dir().join("kinefit_dynamics_model_test");
        std::fs::create_dir_all(&dir).unwrap();

        let (skeleton, motion) = rig();
        let dynamics = CaptureDynamics::from_motion(skeleton, motion, &meters()).unwrap();
        dynamics.save(dir.join("capture")).unwrap();

        let vels = std::fs::read_to_string(dir.join("capture_vels.txt")).unwrap();
        assert_eq!(vels.lines().next().unwrap(), "torsoX,torsoY,torsoZ");
        assert_eq!(vels.lines().count(), 13);

        let avels = std::fs::read_to_string(dir.join("capture_avels.txt")).unwrap();
        assert_eq!(
            avels.lines().next().unwrap(),
            "torsoX,torsoY,torsoZ,lwristX,lwristY,lwristZ,rwristX,rwristY,rwristZ"
        );

        let positions = std::fs::read_to_string(dir.join("capture_positions.txt")).unwrap();
        assert_eq!(
            positions.lines().next().unwrap(),
            "rootX,rootY,rootZ,lwristX,lwristY,lwristZ,rwristX,rwristY,rwristZ"
        );
        assert_eq!(positions.lines().count(), 13);

        for suffix in ["_vels", "_accs", "_avels", "_aaccs", "_positions"] {
            let path = dir.join(format!("capture{suffix}.txt"));
            assert!(path.exists());
            // Cleanup
            std::fs::remove_file(path).unwrap();
        }
        std::fs::remove_dir(&dir).unwrap();
    }
}
