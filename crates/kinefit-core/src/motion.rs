//! Keyframed pose tracks.
//!
//! A [`Motion`] is a uniformly sampled sequence of [`Pose`] keys plus a
//! frame rate. Sampling between keys blends linearly by default; squad
//! blending can be switched on per motion. Times are `f64` seconds.

use crate::pose::Pose;
use crate::skeleton::Skeleton;
use crate::units::LengthUnit;

/// Default capture rate in frames per second.
pub const DEFAULT_FRAME_RATE: f64 = 120.0;

// ---------------------------------------------------------------------------
// Interpolation
// ---------------------------------------------------------------------------

/// Blend mode used when sampling between keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Squad,
}

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// A pose track sampled at a fixed frame rate.
#[derive(Debug, Clone)]
pub struct Motion {
    keys: Vec<Pose>,
    frame_rate: f64,
    dt: f64,
    interpolation: Interpolation,
}

impl Default for Motion {
    fn default() -> Self {
        Self::new()
    }
}

impl Motion {
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            frame_rate: DEFAULT_FRAME_RATE,
            dt: 1.0 / DEFAULT_FRAME_RATE,
            interpolation: Interpolation::Linear,
        }
    }

    /// # Panics
    /// Panics if `frame_rate` is not strictly positive.
    #[must_use]
    pub fn with_frame_rate(frame_rate: f64) -> Self {
        let mut motion = Self::new();
        motion.set_frame_rate(frame_rate);
        motion
    }

    /// Set the blend mode, builder style.
    #[must_use]
    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    #[must_use]
    pub const fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Key spacing in seconds.
    #[must_use]
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// # Panics
    /// Panics if `frame_rate` is not strictly positive.
    pub fn set_frame_rate(&mut self, frame_rate: f64) {
        assert!(frame_rate > 0.0, "frame rate must be positive");
        self.frame_rate = frame_rate;
        self.dt = 1.0 / frame_rate;
    }

    #[must_use]
    pub const fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn set_interpolation(&mut self, interpolation: Interpolation) {
        self.interpolation = interpolation;
    }

    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> &[Pose] {
        &self.keys
    }

    #[must_use]
    pub fn key(&self, index: usize) -> Option<&Pose> {
        self.keys.get(index)
    }

    /// Seconds spanned by the keys; zero for fewer than two keys.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.keys.len().saturating_sub(1) as f64 * self.dt
    }

    fn check_key(&self, pose: &Pose) {
        if let Some(first) = self.keys.first() {
            assert_eq!(
                pose.rotations.len(),
                first.rotations.len(),
                "key has {} rotations, track carries {}",
                pose.rotations.len(),
                first.rotations.len()
            );
        }
    }

    /// # Panics
    /// Panics if the key's rotation count differs from keys already stored.
    pub fn append_key(&mut self, pose: Pose) {
        self.check_key(&pose);
        self.keys.push(pose);
    }

    /// # Panics
    /// Panics if `index > key_count()` or the rotation count differs from
    /// keys already stored.
    pub fn insert_key(&mut self, index: usize, pose: Pose) {
        self.check_key(&pose);
        self.keys.insert(index, pose);
    }

    /// # Panics
    /// Panics if `index` is out of bounds or the rotation count differs from
    /// the other keys.
    pub fn replace_key(&mut self, index: usize, pose: Pose) {
        assert!(index < self.keys.len(), "key index {index} out of bounds");
        let expected = self.keys[index].rotations.len();
        assert_eq!(
            pose.rotations.len(),
            expected,
            "key has {} rotations, track carries {expected}",
            pose.rotations.len()
        );
        self.keys[index] = pose;
    }

    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn remove_key(&mut self, index: usize) -> Pose {
        self.keys.remove(index)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// Key index containing time `t`, with `t` wrapped into
    /// `[0, duration)` first. Zero for motions shorter than two keys.
    #[must_use]
    pub fn key_index_at(&self, t: f64) -> usize {
        let duration = self.duration();
        if duration <= 0.0 {
            return 0;
        }
        let t = t.rem_euclid(duration);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let index = (t / self.dt) as usize;
        index.min(self.keys.len() - 1)
    }

    /// Sample the track at time `t` seconds.
    ///
    /// With `looped` the time wraps into `[0, duration)`; otherwise it
    /// clamps to the first/last key. An empty track yields the default
    /// (empty) pose, a single key is returned as-is.
    #[must_use]
    pub fn value_at(&self, t: f64, looped: bool) -> Pose {
        match self.keys.len() {
            0 => return Pose::default(),
            1 => return self.keys[0].clone(),
            _ => {}
        }
        let duration = self.duration();
        let t = if looped {
            t.rem_euclid(duration)
        } else if t < 0.0 {
            return self.keys[0].clone();
        } else if t >= duration {
            return self.keys[self.keys.len() - 1].clone();
        } else {
            t
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let segment = ((t / self.dt) as usize).min(self.keys.len() - 2);
        #[allow(clippy::cast_possible_truncation)]
        let u = ((t - segment as f64 * self.dt) / self.dt) as f32;
        match self.interpolation {
            // Squad needs an outer key on each side; shorter tracks blend
            // linearly.
            Interpolation::Squad if self.keys.len() >= 3 => {
                let last = self.keys.len() - 1;
                let (before, after) = if looped {
                    (
                        (segment + self.keys.len() - 1) % self.keys.len(),
                        (segment + 2) % self.keys.len(),
                    )
                } else {
                    (segment.saturating_sub(1), (segment + 2).min(last))
                };
                Pose::squad(
                    &self.keys[before],
                    &self.keys[segment],
                    &self.keys[segment + 1],
                    &self.keys[after],
                    u,
                )
            }
            _ => Pose::lerp(&self.keys[segment], &self.keys[segment + 1], u),
        }
    }

    /// Sample at `t` and pose the skeleton with the result.
    ///
    /// # Panics
    /// Panics if the sampled pose's rotation count differs from the
    /// skeleton's joint count.
    pub fn apply_to(&self, skeleton: &mut Skeleton, t: f64, looped: bool) {
        skeleton.set_pose(&self.value_at(t, looped));
    }

    /// Rescale every key's root position by the unit conversion factor.
    /// Rotations are untouched.
    pub fn convert_units(&mut self, from: LengthUnit, to: LengthUnit) {
        let factor = from.factor_to(to);
        for key in &mut self.keys {
            key.root_position *= factor;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
