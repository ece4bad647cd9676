//! A single joint in an articulated skeleton.

use nalgebra::Vector3;

use crate::rotation::RotationOrder;
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// ChannelSet
// ---------------------------------------------------------------------------

/// Which motion channels a joint carries in a capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelSet {
    /// Three position channels followed by three rotation channels.
    #[default]
    PositionRotation,
    /// Three rotation channels.
    Rotation,
    /// No channels (end site).
    None,
}

impl ChannelSet {
    /// Number of scalar channels per frame.
    #[must_use]
    pub const fn count(self) -> usize {
        match self {
            ChannelSet::PositionRotation => 6,
            ChannelSet::Rotation => 3,
            ChannelSet::None => 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Joint
// ---------------------------------------------------------------------------

/// A named joint with a local transform relative to its parent.
///
/// Joints live in a [`Skeleton`](crate::skeleton::Skeleton) arena; parent and
/// child links are arena indices and are maintained by the skeleton, not by
/// the joint itself. The cached global transform is refreshed by
/// [`Skeleton::update_global_transforms`](crate::skeleton::Skeleton::update_global_transforms).
#[derive(Debug, Clone)]
pub struct Joint {
    pub(crate) name: String,
    pub(crate) id: usize,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) channels: ChannelSet,
    pub(crate) rotation_order: RotationOrder,
    pub(crate) local: Transform,
    pub(crate) global: Transform,
}

impl Joint {
    /// Create a joint with default channels (position + rotation) and XYZ
    /// rotation order.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: 0,
            parent: None,
            children: Vec::new(),
            channels: ChannelSet::default(),
            rotation_order: RotationOrder::default(),
            local: Transform::identity(),
            global: Transform::identity(),
        }
    }

    /// Set the channel set, builder style.
    #[must_use]
    pub fn with_channels(mut self, channels: ChannelSet) -> Self {
        self.channels = channels;
        self
    }

    /// Set the rotation order, builder style.
    #[must_use]
    pub fn with_rotation_order(mut self, order: RotationOrder) -> Self {
        self.rotation_order = order;
        self
    }

    /// Set the local translation (bone offset), builder style.
    #[must_use]
    pub fn with_offset(mut self, offset: Vector3<f32>) -> Self {
        self.local.translation = offset;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Arena index of this joint within its skeleton.
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    #[must_use]
    pub const fn channels(&self) -> ChannelSet {
        self.channels
    }

    pub fn set_channels(&mut self, channels: ChannelSet) {
        self.channels = channels;
    }

    #[must_use]
    pub const fn rotation_order(&self) -> RotationOrder {
        self.rotation_order
    }

    pub fn set_rotation_order(&mut self, order: RotationOrder) {
        self.rotation_order = order;
    }

    /// Transform relative to the parent joint.
    #[must_use]
    pub const fn local(&self) -> &Transform {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Transform {
        &mut self.local
    }

    /// Cached model-space transform from the last forward-kinematics pass.
    #[must_use]
    pub const fn global(&self) -> &Transform {
        &self.global
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
