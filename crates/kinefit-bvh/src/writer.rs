//! Motion file writing.
//!
//! Mirrors the reader's layout: hierarchy block first, then the frame
//! rows. The root offset is written as zeros because the root translation
//! travels in the motion channels, and a joint is written as an end site
//! exactly when it has no children, regardless of its stored channel set.

use std::fmt::Write as _;
use std::path::Path;

use tracing::debug;

use kinefit_core::{Motion, Pose, RotationOrder, Skeleton};

use crate::error::BvhError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a motion file to disk.
///
/// # Panics
/// Panics if a motion key carries fewer rotations than the skeleton has
/// joints.
pub fn write_file(
    path: impl AsRef<Path>,
    skeleton: &Skeleton,
    motion: &Motion,
) -> Result<(), BvhError> {
    let path = path.as_ref();
    let content = write_string(skeleton, motion);
    std::fs::write(path, content).map_err(|source| BvhError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        path = %path.display(),
        joints = skeleton.joint_count(),
        frames = motion.key_count(),
        "wrote motion file"
    );
    Ok(())
}

/// Render a skeleton and motion as motion file content.
///
/// # Panics
/// Panics if a motion key carries fewer rotations than the skeleton has
/// joints.
#[must_use]
pub fn write_string(skeleton: &Skeleton, motion: &Motion) -> String {
    let mut out = String::new();
    out.push_str("HIERARCHY\n");
    if let Some(root) = skeleton.root() {
        let _ = writeln!(out, "ROOT {}", root.name());
        out.push_str("{\n");
        out.push_str("\tOFFSET 0.00 0.00 0.00\n");
        let _ = writeln!(
            out,
            "\tCHANNELS 6 Xposition Yposition Zposition {}",
            rotation_channels(root.rotation_order())
        );
        for &child in root.children() {
            write_joint(&mut out, skeleton, child, 1);
        }
        out.push_str("}\n");
    }
    out.push_str("MOTION\n");
    let _ = writeln!(out, "Frames: {}", motion.key_count());
    let _ = writeln!(out, "Frame Time: {:.6}", motion.dt());
    for key in motion.keys() {
        write_frame(&mut out, skeleton, key);
    }
    out
}

// ---------------------------------------------------------------------------
// Hierarchy section
// ---------------------------------------------------------------------------

fn write_joint(out: &mut String, skeleton: &Skeleton, id: usize, depth: usize) {
    let joint = skeleton.joint(id);
    let tabs = "\t".repeat(depth);
    let offset = joint.local().translation;
    if joint.is_leaf() {
        if joint.name().contains("Site") {
            let _ = writeln!(out, "{tabs}End Site");
        } else {
            let _ = writeln!(out, "{tabs}End {}", joint.name());
        }
        let _ = writeln!(out, "{tabs}{{");
        let _ = writeln!(
            out,
            "{tabs}\tOFFSET {:.6} {:.6} {:.6}",
            offset.x, offset.y, offset.z
        );
        let _ = writeln!(out, "{tabs}}}");
    } else {
        let _ = writeln!(out, "{tabs}JOINT {}", joint.name());
        let _ = writeln!(out, "{tabs}{{");
        let _ = writeln!(
            out,
            "{tabs}\tOFFSET {:.6} {:.6} {:.6}",
            offset.x, offset.y, offset.z
        );
        let _ = writeln!(
            out,
            "{tabs}\tCHANNELS 3 {}",
            rotation_channels(joint.rotation_order())
        );
        for &child in joint.children() {
            write_joint(out, skeleton, child, depth + 1);
        }
        let _ = writeln!(out, "{tabs}}}");
    }
}

const fn rotation_channels(order: RotationOrder) -> &'static str {
    match order {
        RotationOrder::Xyz => "Xrotation Yrotation Zrotation",
        RotationOrder::Xzy => "Xrotation Zrotation Yrotation",
        RotationOrder::Yxz => "Yrotation Xrotation Zrotation",
        RotationOrder::Yzx => "Yrotation Zrotation Xrotation",
        RotationOrder::Zxy => "Zrotation Xrotation Yrotation",
        RotationOrder::Zyx => "Zrotation Yrotation Xrotation",
    }
}

// ---------------------------------------------------------------------------
// Motion section
// ---------------------------------------------------------------------------

fn write_frame(out: &mut String, skeleton: &Skeleton, key: &Pose) {
    let mut values = Vec::new();
    let p = key.root_position;
    values.push(format!("{:.6}", p.x));
    values.push(format!("{:.6}", p.y));
    values.push(format!("{:.6}", p.z));
    for joint in skeleton.joints() {
        if joint.is_leaf() {
            continue;
        }
        let order = joint.rotation_order();
        let angles = order.euler_angles(&key.rotations[joint.id()]);
        for &axis in &order.axes() {
            values.push(format!("{:.6}", angles[axis].to_degrees()));
        }
    }
    out.push_str(&values.join("\t"));
    out.push('\n');
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
