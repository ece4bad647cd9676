//! Length and weight units used by capture files and subject data.
//!
//! Conversion factors are kept as the literal table values rather than
//! derived at runtime, so converted data reproduces existing exports bit
//! for bit.

// ---------------------------------------------------------------------------
// LengthUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthUnit {
    Mm,
    Cm,
    M,
    Inch,
    Ft,
}

impl LengthUnit {
    /// Multiplier taking a value in `self` to a value in `to`.
    #[must_use]
    pub const fn factor_to(self, to: LengthUnit) -> f32 {
        use LengthUnit::{Cm, Ft, Inch, M, Mm};
        match (self, to) {
            (Mm, Cm) => 0.1,
            (Mm, M) => 0.001,
            (Mm, Inch) => 0.039_370_1,
            (Mm, Ft) => 0.003_280_84,
            (Cm, Mm) => 10.0,
            (Cm, M) => 0.01,
            (Cm, Inch) => 0.393_701,
            (Cm, Ft) => 0.032_808_4,
            (M, Mm) => 1000.0,
            (M, Cm) => 100.0,
            (M, Inch) => 39.370_1,
            (M, Ft) => 3.280_84,
            (Inch, Mm) => 25.4,
            (Inch, Cm) => 2.54,
            (Inch, M) => 0.0254,
            (Inch, Ft) => 0.083_333_3,
            (Ft, Mm) => 304.8,
            (Ft, Cm) => 30.48,
            (Ft, M) => 0.3048,
            (Ft, Inch) => 12.0,
            _ => 1.0,
        }
    }

    #[must_use]
    pub const fn convert(self, value: f32, to: LengthUnit) -> f32 {
        value * self.factor_to(to)
    }
}

// ---------------------------------------------------------------------------
// WeightUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    /// Multiplier taking a value in `self` to a value in `to`.
    #[must_use]
    pub const fn factor_to(self, to: WeightUnit) -> f32 {
        use WeightUnit::{Kg, Lb};
        match (self, to) {
            (Lb, Kg) => 0.453_592,
            (Kg, Lb) => 2.204_62,
            _ => 1.0,
        }
    }

    #[must_use]
    pub const fn convert(self, value: f32, to: WeightUnit) -> f32 {
        value * self.factor_to(to)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
