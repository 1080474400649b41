pub mod aabb;
pub mod homogeneous;
pub mod ray;
pub mod transform;

pub use glam::{DAffine3, DMat3, DVec3, DVec4};
pub use aabb::Aabb3;
pub use ray::Ray;
pub use transform::Transform;

pub type Point3 = DVec3;
pub type Vector3 = DVec3;

/// Homogeneous control point `(w*x, w*y, w*z, w)`.
pub type HPoint = DVec4;
