//! Arena-based joint hierarchy.
//!
//! Joints are stored in a flat `Vec` in insertion order; parent and child
//! links are indices into that arena. Insertion always appends, so a parent
//! id is strictly smaller than every id in its subtree. The forward
//! kinematics pass exploits that ordering with a single forward sweep,
//! and `Clone` gives a correct deep copy for free.

use nalgebra::Vector3;

use crate::joint::{ChannelSet, Joint};
use crate::pose::Pose;
use crate::units::LengthUnit;

// ---------------------------------------------------------------------------
// Skeleton
// ---------------------------------------------------------------------------

/// A joint hierarchy with cached global transforms.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    joints: Vec<Joint>,
}

impl Skeleton {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a joint under `parent` (`None` makes it the root) and return
    /// its id.
    ///
    /// Autogenerated end-site names beginning with `"Site"` are renamed to
    /// `"Site{id}"` so repeated insertions stay unique.
    ///
    /// # Panics
    /// Panics if `parent` is not a valid joint id.
    pub fn add_joint(&mut self, mut joint: Joint, parent: Option<usize>) -> usize {
        let id = self.joints.len();
        joint.id = id;
        joint.parent = parent;
        joint.children.clear();
        if joint.name.starts_with("Site") {
            joint.name = format!("Site{id}");
        }
        if let Some(parent) = parent {
            assert!(parent < id, "parent id {parent} out of bounds");
            self.joints[parent].children.push(id);
        }
        self.joints.push(joint);
        id
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    /// Mutable access to every joint. Structure links stay private to the
    /// arena, so callers can edit names, channels and local transforms but
    /// cannot break parent/child wiring.
    pub fn joints_mut(&mut self) -> impl Iterator<Item = &mut Joint> {
        self.joints.iter_mut()
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    #[must_use]
    pub fn joint(&self, id: usize) -> &Joint {
        &self.joints[id]
    }

    /// # Panics
    /// Panics if `id` is out of bounds.
    pub fn joint_mut(&mut self, id: usize) -> &mut Joint {
        &mut self.joints[id]
    }

    #[must_use]
    pub fn root(&self) -> Option<&Joint> {
        self.joints.first()
    }

    /// Exact name lookup.
    #[must_use]
    pub fn joint_index(&self, name: &str) -> Option<usize> {
        self.joints.iter().position(|j| j.name == name)
    }

    /// Case-insensitive substring lookup, first match in id order.
    #[must_use]
    pub fn find_joint(&self, fragment: &str) -> Option<usize> {
        let fragment = fragment.to_lowercase();
        self.joints
            .iter()
            .position(|j| j.name.to_lowercase().contains(&fragment))
    }

    /// Like [`find_joint`](Self::find_joint), trying each fragment in turn;
    /// an earlier fragment wins even when a later one would match a joint
    /// with a smaller id.
    #[must_use]
    pub fn find_joint_any(&self, fragments: &[&str]) -> Option<usize> {
        fragments.iter().find_map(|f| self.find_joint(f))
    }

    /// Find a joint by fragment, then follow first children down to a leaf.
    #[must_use]
    pub fn find_end_effector(&self, fragment: &str) -> Option<usize> {
        let mut id = self.find_joint(fragment)?;
        while let Some(&child) = self.joints[id].children.first() {
            id = child;
        }
        Some(id)
    }

    /// Remove the named joint and its whole subtree.
    ///
    /// Remaining ids are reassigned contiguously in their original order. A
    /// parent left childless has become an end effector and loses its
    /// channels. Returns `false` when no joint carries the name.
    pub fn remove_joint(&mut self, name: &str) -> bool {
        let Some(start) = self.joint_index(name) else {
            return false;
        };
        let mut doomed = vec![false; self.joints.len()];
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            doomed[id] = true;
            stack.extend(self.joints[id].children.iter().copied());
        }
        if let Some(parent) = self.joints[start].parent {
            self.joints[parent].children.retain(|&c| c != start);
            if self.joints[parent].children.is_empty() {
                self.joints[parent].channels = ChannelSet::None;
            }
        }
        let mut remap = vec![usize::MAX; self.joints.len()];
        let mut next = 0;
        for (id, gone) in doomed.iter().enumerate() {
            if !gone {
                remap[id] = next;
                next += 1;
            }
        }
        let survivors = std::mem::take(&mut self.joints);
        self.joints = survivors
            .into_iter()
            .filter(|joint| !doomed[joint.id])
            .map(|mut joint| {
                joint.id = remap[joint.id];
                joint.parent = joint.parent.map(|p| remap[p]);
                for child in &mut joint.children {
                    *child = remap[*child];
                }
                joint
            })
            .collect();
        true
    }

    /// Recompute every cached global transform from the local ones.
    ///
    /// Single forward sweep; correct because a parent id is always smaller
    /// than its children's ids.
    pub fn update_global_transforms(&mut self) {
        for id in 0..self.joints.len() {
            let global = match self.joints[id].parent {
                None => self.joints[id].local,
                Some(p) => self.joints[p].global * self.joints[id].local,
            };
            self.joints[id].global = global;
        }
    }

    /// Snapshot the current configuration: root translation plus every local
    /// rotation in id order.
    #[must_use]
    pub fn pose(&self) -> Pose {
        let root_position = self
            .root()
            .map_or_else(Vector3::zeros, |root| root.local.translation);
        let rotations = self.joints.iter().map(|j| j.local.rotation).collect();
        Pose::new(root_position, rotations)
    }

    /// Apply a pose and refresh global transforms.
    ///
    /// # Panics
    /// Panics if the pose's rotation count differs from the joint count.
    pub fn set_pose(&mut self, pose: &Pose) {
        assert_eq!(
            pose.rotations.len(),
            self.joints.len(),
            "pose has {} rotations for {} joints",
            pose.rotations.len(),
            self.joints.len()
        );
        if let Some(root) = self.joints.first_mut() {
            root.local.translation = pose.root_position;
        }
        for (joint, rotation) in self.joints.iter_mut().zip(&pose.rotations) {
            joint.local.rotation = *rotation;
        }
        self.update_global_transforms();
    }

    /// Rescale every local translation by the unit conversion factor and
    /// refresh global transforms. Rotations are untouched.
    pub fn convert_units(&mut self, from: LengthUnit, to: LengthUnit) {
        let factor = from.factor_to(to);
        for joint in &mut self.joints {
            joint.local.translation *= factor;
        }
        self.update_global_transforms();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
