//! Motion file parsing.
//!
//! The format is the classic two-section text layout: a `HIERARCHY` block
//! declaring joints, offsets and channels, then a `MOTION` block of
//! whitespace-separated channel values, one row per frame. Rotations are
//! stored in degrees in the per-joint channel order; translations beyond
//! the root's are parsed and discarded, which matches how the files are
//! produced.

use std::path::Path;

use nalgebra::{UnitQuaternion, Vector3};
use tracing::debug;

use kinefit_core::{ChannelSet, Joint, Motion, Pose, RotationOrder, Skeleton};

use crate::error::BvhError;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// A parsed motion file: the rest-pose skeleton plus its pose track.
///
/// Built whole or not at all; a parse failure never yields a partially
/// populated skeleton.
#[derive(Debug, Clone)]
pub struct MotionFile {
    pub skeleton: Skeleton,
    pub motion: Motion,
}

/// Parse a motion file from disk.
pub fn parse_file(path: impl AsRef<Path>) -> Result<MotionFile, BvhError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| BvhError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_string(&content)
}

/// Parse motion file content from a string.
pub fn parse_string(content: &str) -> Result<MotionFile, BvhError> {
    let mut cursor = Cursor::new(content);
    cursor.expect("HIERARCHY")?;

    let mut skeleton = Skeleton::new();
    match cursor.next_token() {
        Some("ROOT" | "JOINT") => parse_joint(&mut cursor, &mut skeleton, None)?,
        Some(found) => {
            return Err(BvhError::UnexpectedToken {
                expected: "ROOT".into(),
                found: found.into(),
                line: cursor.line,
            })
        }
        None => {
            return Err(BvhError::UnexpectedEof {
                expected: "ROOT".into(),
            })
        }
    }
    skeleton.update_global_transforms();

    cursor.expect("MOTION")?;
    cursor.expect("Frames:")?;
    let frame_count = cursor.next_usize("frame count")?;
    cursor.expect("Frame")?;
    cursor.expect("Time:")?;
    let dt = cursor.next_f64("frame time")?;
    if !(dt.is_finite() && dt > 0.0) {
        return Err(BvhError::InvalidFrameTime(dt));
    }

    let layout: Vec<(ChannelSet, RotationOrder)> = skeleton
        .joints()
        .iter()
        .map(|j| (j.channels(), j.rotation_order()))
        .collect();

    let mut motion = Motion::with_frame_rate(1.0 / dt);
    for frame in 0..frame_count {
        let mut pose = Pose::with_joints(layout.len());
        for (id, &(channels, order)) in layout.iter().enumerate() {
            match channels {
                ChannelSet::PositionRotation => {
                    let tx = frame_value(&mut cursor, frame_count, frame)?;
                    let ty = frame_value(&mut cursor, frame_count, frame)?;
                    let tz = frame_value(&mut cursor, frame_count, frame)?;
                    let r1 = frame_value(&mut cursor, frame_count, frame)?;
                    let r2 = frame_value(&mut cursor, frame_count, frame)?;
                    let r3 = frame_value(&mut cursor, frame_count, frame)?;
                    if id == 0 {
                        pose.root_position = Vector3::new(tx, ty, tz);
                    }
                    pose.rotations[id] = channel_rotation(order, r1, r2, r3);
                }
                ChannelSet::Rotation => {
                    let r1 = frame_value(&mut cursor, frame_count, frame)?;
                    let r2 = frame_value(&mut cursor, frame_count, frame)?;
                    let r3 = frame_value(&mut cursor, frame_count, frame)?;
                    pose.rotations[id] = channel_rotation(order, r1, r2, r3);
                }
                ChannelSet::None => {}
            }
        }
        motion.append_key(pose);
    }

    debug!(
        joints = skeleton.joint_count(),
        frames = motion.key_count(),
        "parsed motion file"
    );
    Ok(MotionFile { skeleton, motion })
}

// ---------------------------------------------------------------------------
// Hierarchy section
// ---------------------------------------------------------------------------

fn parse_joint(
    cursor: &mut Cursor<'_>,
    skeleton: &mut Skeleton,
    parent: Option<usize>,
) -> Result<(), BvhError> {
    let name = cursor.rest_of_line().to_string();
    cursor.expect("{")?;
    cursor.expect("OFFSET")?;
    let offset = parse_offset(cursor)?;
    cursor.expect("CHANNELS")?;
    let count = cursor.next_usize("channel count")?;
    let channel_line = cursor.line;
    let channel_text = cursor.rest_of_line();
    let channels = match count {
        6 => ChannelSet::PositionRotation,
        3 => ChannelSet::Rotation,
        0 => ChannelSet::None,
        count => {
            return Err(BvhError::UnsupportedChannelCount {
                count,
                line: channel_line,
            })
        }
    };
    let order = if channels == ChannelSet::None {
        RotationOrder::default()
    } else {
        rotation_order_of(channel_text, channel_line)?
    };
    let id = skeleton.add_joint(
        Joint::new(name)
            .with_channels(channels)
            .with_rotation_order(order)
            .with_offset(offset),
        parent,
    );

    loop {
        match cursor.next_token() {
            Some("JOINT") => parse_joint(cursor, skeleton, Some(id))?,
            Some("End") => parse_end_site(cursor, skeleton, id)?,
            Some("}") => return Ok(()),
            Some(found) => {
                return Err(BvhError::UnexpectedToken {
                    expected: "JOINT, End or }".into(),
                    found: found.into(),
                    line: cursor.line,
                })
            }
            None => {
                return Err(BvhError::UnexpectedEof {
                    expected: "}".into(),
                })
            }
        }
    }
}

fn parse_end_site(
    cursor: &mut Cursor<'_>,
    skeleton: &mut Skeleton,
    parent: usize,
) -> Result<(), BvhError> {
    // End sites are usually all written as "End Site"; qualify the name
    // with the parent's so it stays unique.
    let raw = cursor.rest_of_line();
    let name = if raw.contains("Site") {
        format!("{}Site", skeleton.joint(parent).name())
    } else {
        raw.to_string()
    };
    cursor.expect("{")?;
    cursor.expect("OFFSET")?;
    let offset = parse_offset(cursor)?;
    cursor.expect("}")?;
    skeleton.add_joint(
        Joint::new(name)
            .with_channels(ChannelSet::None)
            .with_offset(offset),
        Some(parent),
    );
    Ok(())
}

fn parse_offset(cursor: &mut Cursor<'_>) -> Result<Vector3<f32>, BvhError> {
    let x = cursor.next_f32("offset")?;
    let y = cursor.next_f32("offset")?;
    let z = cursor.next_f32("offset")?;
    Ok(Vector3::new(x, y, z))
}

fn rotation_order_of(channels: &str, line: usize) -> Result<RotationOrder, BvhError> {
    const TRIPLES: [(&str, RotationOrder); 6] = [
        ("Xrotation Yrotation Zrotation", RotationOrder::Xyz),
        ("Xrotation Zrotation Yrotation", RotationOrder::Xzy),
        ("Yrotation Xrotation Zrotation", RotationOrder::Yxz),
        ("Yrotation Zrotation Xrotation", RotationOrder::Yzx),
        ("Zrotation Xrotation Yrotation", RotationOrder::Zxy),
        ("Zrotation Yrotation Xrotation", RotationOrder::Zyx),
    ];
    TRIPLES
        .iter()
        .find(|(needle, _)| channels.contains(needle))
        .map(|&(_, order)| order)
        .ok_or_else(|| BvhError::UnknownRotationOrder {
            channels: channels.trim().to_string(),
            line,
        })
}

// ---------------------------------------------------------------------------
// Motion section
// ---------------------------------------------------------------------------

fn frame_value(cursor: &mut Cursor<'_>, expected: usize, found: usize) -> Result<f32, BvhError> {
    match cursor.next_token() {
        None => Err(BvhError::TruncatedFrames { expected, found }),
        Some(token) => token.parse().map_err(|_| BvhError::MalformedNumber {
            token: token.into(),
            line: cursor.line,
        }),
    }
}

/// Compose channel values (degrees, in the joint's channel order) into a
/// rotation.
fn channel_rotation(order: RotationOrder, r1: f32, r2: f32, r3: f32) -> UnitQuaternion<f32> {
    let axes = order.axes();
    let mut angles = Vector3::zeros();
    angles[axes[0]] = r1.to_radians();
    angles[axes[1]] = r2.to_radians();
    angles[axes[2]] = r3.to_radians();
    order.to_quaternion(angles)
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Whitespace token stream with line tracking.
struct Cursor<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(content: &'a str) -> Self {
        Self {
            rest: content,
            line: 1,
        }
    }

    fn skip_whitespace(&mut self) {
        let mut offset = self.rest.len();
        for (i, c) in self.rest.char_indices() {
            if !c.is_whitespace() {
                offset = i;
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
        }
        self.rest = &self.rest[offset..];
    }

    fn next_token(&mut self) -> Option<&'a str> {
        self.skip_whitespace();
        if self.rest.is_empty() {
            return None;
        }
        let end = self
            .rest
            .find(char::is_whitespace)
            .unwrap_or(self.rest.len());
        let (token, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(token)
    }

    /// Everything up to (not including) the next newline, trimmed.
    fn rest_of_line(&mut self) -> &'a str {
        let end = self.rest.find('\n').unwrap_or(self.rest.len());
        let (line, rest) = self.rest.split_at(end);
        self.rest = rest;
        line.trim()
    }

    fn expect(&mut self, expected: &str) -> Result<(), BvhError> {
        match self.next_token() {
            None => Err(BvhError::UnexpectedEof {
                expected: expected.into(),
            }),
            Some(token) if token == expected => Ok(()),
            Some(found) => Err(BvhError::UnexpectedToken {
                expected: expected.into(),
                found: found.into(),
                line: self.line,
            }),
        }
    }

    fn next_f32(&mut self, context: &str) -> Result<f32, BvhError> {
        let token = self.next_token().ok_or_else(|| BvhError::UnexpectedEof {
            expected: context.into(),
        })?;
        token.parse().map_err(|_| BvhError::MalformedNumber {
            token: token.into(),
            line: self.line,
        })
    }

    fn next_f64(&mut self, context: &str) -> Result<f64, BvhError> {
        let token = self.next_token().ok_or_else(|| BvhError::UnexpectedEof {
            expected: context.into(),
        })?;
        token.parse().map_err(|_| BvhError::MalformedNumber {
            token: token.into(),
            line: self.line,
        })
    }

    fn next_usize(&mut self, context: &str) -> Result<usize, BvhError> {
        let token = self.next_token().ok_or_else(|| BvhError::UnexpectedEof {
            expected: context.into(),
        })?;
        token.parse().map_err(|_| BvhError::MalformedNumber {
            token: token.into(),
            line: self.line,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
