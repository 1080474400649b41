//! Curve trait and the rational B-spline curve.

mod conic;
mod interpolate;
mod nurbs_curve;

use knotwork_core::Result;
use knotwork_math::{Point3, Vector3};

pub use nurbs_curve::NurbsCurve;

/// Trait for parametric curves in 3D space.
pub trait Curve: Send + Sync {
    /// Evaluate the curve at parameter `t`.
    fn point_at(&self, t: f64) -> Result<Point3>;

    /// Unit tangent at parameter `t`, or zero where it is undefined.
    fn tangent_at(&self, t: f64) -> Result<Vector3>;

    /// Return the parameter domain `(t_min, t_max)`.
    fn domain(&self) -> (f64, f64);

    /// Whether the curve is closed (start == end).
    fn is_closed(&self) -> bool {
        false
    }
}
