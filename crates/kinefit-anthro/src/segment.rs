//! Anthropometric body segments.
//!
//! Eight canonical segments cover the whole body. Each carries regression
//! coefficients for its share of total body mass, the proximal position of
//! its center of mass, its radius of gyration about the proximal end, and a
//! linear density model in the subject's overall body density.

// ---------------------------------------------------------------------------
// Body segments
// ---------------------------------------------------------------------------

/// A canonical anthropometric segment.
///
/// Bilateral segments (everything except [`HeadNeck`](Self::HeadNeck) and
/// [`Trunk`](Self::Trunk)) describe one side; a full body carries two of
/// each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodySegment {
    Hand,
    Forearm,
    UpperArm,
    Foot,
    Shank,
    Thigh,
    HeadNeck,
    Trunk,
}

impl BodySegment {
    /// All segments, trunk last.
    pub const ALL: [BodySegment; 8] = [
        BodySegment::Hand,
        BodySegment::Forearm,
        BodySegment::UpperArm,
        BodySegment::Foot,
        BodySegment::Shank,
        BodySegment::Thigh,
        BodySegment::HeadNeck,
        BodySegment::Trunk,
    ];

    /// Fraction of total body mass carried by one instance of this segment.
    #[must_use]
    pub const fn mass_fraction(self) -> f32 {
        match self {
            BodySegment::Hand => 0.006,
            BodySegment::Forearm => 0.016,
            BodySegment::UpperArm => 0.028,
            BodySegment::Foot => 0.0145,
            BodySegment::Shank => 0.0465,
            BodySegment::Thigh => 0.1,
            BodySegment::HeadNeck => 0.081,
            BodySegment::Trunk => 0.497,
        }
    }

    /// Center of mass position as a fraction of segment length, measured
    /// from the proximal end.
    #[must_use]
    pub const fn com_proximal_fraction(self) -> f32 {
        match self {
            BodySegment::Hand => 0.506,
            BodySegment::Forearm => 0.430,
            BodySegment::UpperArm => 0.436,
            BodySegment::Foot => 0.5,
            BodySegment::Shank => 0.433,
            BodySegment::Thigh => 0.433,
            BodySegment::HeadNeck => 0.5,
            BodySegment::Trunk => 0.5,
        }
    }

    /// Center of mass position as a fraction of segment length, measured
    /// from the distal end.
    #[must_use]
    pub fn com_distal_fraction(self) -> f32 {
        1.0 - self.com_proximal_fraction()
    }

    /// Radius of gyration about the proximal end as a fraction of segment
    /// length.
    #[must_use]
    pub const fn gyration_proximal_fraction(self) -> f32 {
        match self {
            BodySegment::Hand => 0.297,
            BodySegment::Forearm => 0.303,
            BodySegment::UpperArm => 0.322,
            BodySegment::Foot => 0.475,
            BodySegment::Shank => 0.302,
            BodySegment::Thigh => 0.323,
            BodySegment::HeadNeck => 0.495,
            BodySegment::Trunk => 0.5,
        }
    }

    /// Segment density in g/cm3 as a linear function of the subject's
    /// overall body density.
    #[must_use]
    pub fn density(self, body_density: f32) -> f32 {
        let (intercept, slope) = match self {
            BodySegment::Hand => (-0.44, 1.5),
            BodySegment::Forearm => (-0.0675, 1.125),
            BodySegment::UpperArm => (0.4225, 0.625),
            BodySegment::Foot => (0.3933, 0.6667),
            BodySegment::Shank => (0.555, 0.5),
            BodySegment::Thigh => (0.3533, 0.6667),
            BodySegment::HeadNeck => (1.11, 0.0),
            BodySegment::Trunk => (1.03, 0.0),
        };
        intercept + slope * body_density
    }
}

// ---------------------------------------------------------------------------
// Whole-body regressions
// ---------------------------------------------------------------------------

/// Estimates body weight in kilograms from stature in meters.
#[must_use]
pub fn weight_from_height(height: f32) -> f32 {
    -61.7542 + 73.0766 * height
}

/// Overall body density in g/cm3 from stature in meters and weight in
/// kilograms.
#[must_use]
pub fn body_density(height: f32, weight: f32) -> f32 {
    0.69 + 0.9 * (height / weight.cbrt())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
