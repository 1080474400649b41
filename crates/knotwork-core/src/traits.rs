use crate::error::Result;

/// Check the structural invariants of a curve, surface, or knot vector.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Bounds of an entity's control hull.
///
/// NURBS geometry lies inside the convex hull of its control points, so
/// these bounds always enclose the evaluated geometry.
pub trait ControlHullBounds {
    type Bounds;
    fn control_hull_bounds(&self) -> Self::Bounds;
}
