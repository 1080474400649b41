use crate::{Point3, Vector3};

/// A line through `origin` along a unit `direction`, used to check conic
/// frames for parallel axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Squared sine of the angle below which two rays count as parallel.
    const PARALLEL_EPS: f64 = 1e-12;

    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Get a point along the ray at parameter t.
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Parameters `(s, t)` of the closest approach between the two supporting
    /// lines, or `None` if the rays are parallel.
    ///
    /// For coplanar, non-parallel rays `self.at(s) == other.at(t)`.
    pub fn intersect(&self, other: &Ray) -> Option<(f64, f64)> {
        let b = self.direction.dot(other.direction);
        let denom = 1.0 - b * b;
        if denom < Self::PARALLEL_EPS {
            return None;
        }
        let w0 = self.origin - other.origin;
        let d = self.direction.dot(w0);
        let e = other.direction.dot(w0);
        let s = (b * e - d) / denom;
        let t = (e - b * d) / denom;
        Some((s, t))
    }
}
