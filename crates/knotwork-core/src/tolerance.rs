/// Tolerances for geometric and parametric comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Linear tolerance for distance comparisons (in model units)
    pub linear: f64,
    /// Parametric tolerance for knot and parameter comparisons
    pub parametric: f64,
}

impl Tolerance {
    pub const DEFAULT_LINEAR: f64 = 1e-7;
    pub const DEFAULT_PARAMETRIC: f64 = 1e-10;

    /// The tolerances every kernel operation compares with.
    pub const DEFAULT: Tolerance = Tolerance {
        linear: Self::DEFAULT_LINEAR,
        parametric: Self::DEFAULT_PARAMETRIC,
    };

    /// Check if a distance is zero within linear tolerance
    pub fn is_zero(self, v: f64) -> bool {
        v.abs() < self.linear
    }

    /// Check if two parameters (knots) coincide
    pub fn param_eq(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= self.parametric
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
