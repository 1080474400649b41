//! knotwork geometry: rational B-spline curves and surfaces.
//!
//! The [`nurbs`] module holds the algorithms as free functions over knot
//! vectors and homogeneous control points. [`curve::NurbsCurve`] and
//! [`surface::NurbsSurface`] wrap them with validated construction.

pub mod curve;
pub mod length;
pub mod nurbs;
pub mod surface;
pub mod tessellate;

pub use curve::{Curve, NurbsCurve};
pub use length::ArcLengthTable;
pub use nurbs::{Direction, KnotVector};
pub use surface::{NurbsSurface, Surface};
pub use tessellate::SamplingOptions;
