//! Surface trait and the rational tensor-product surface.

mod nurbs_surface;

use knotwork_core::Result;
use knotwork_math::{Point3, Vector3};

pub use nurbs_surface::NurbsSurface;

/// Trait for parametric surfaces in 3D space.
pub trait Surface: Send + Sync {
    /// Evaluate the surface at parameters `(u, v)`.
    fn point_at(&self, u: f64, v: f64) -> Result<Point3>;

    /// Unit normal at `(u, v)`, or zero where the partials are parallel.
    fn normal_at(&self, u: f64, v: f64) -> Result<Vector3>;

    /// Return the u-parameter domain `(u_min, u_max)`.
    fn domain_u(&self) -> (f64, f64);

    /// Return the v-parameter domain `(v_min, v_max)`.
    fn domain_v(&self) -> (f64, f64);
}
