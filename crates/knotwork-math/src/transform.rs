use crate::{DAffine3, HPoint, Point3, Vector3};

/// Affine transform applied to NURBS geometry through its control points.
///
/// NURBS are affinely invariant, so mapping the control points maps the
/// curve exactly. Homogeneous points carry their weight through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub affine: DAffine3,
}

impl Transform {
    pub fn identity() -> Self {
        Self::from_affine(DAffine3::IDENTITY)
    }

    pub fn from_translation(t: Vector3) -> Self {
        Self::from_affine(DAffine3::from_translation(t))
    }

    pub fn from_scale(s: Vector3) -> Self {
        Self::from_affine(DAffine3::from_scale(s))
    }

    pub fn from_axis_angle(axis: Vector3, angle: f64) -> Self {
        Self::from_affine(DAffine3::from_axis_angle(axis.normalize(), angle))
    }

    pub fn from_affine(affine: DAffine3) -> Self {
        Self { affine }
    }

    pub fn transform_point(&self, p: Point3) -> Point3 {
        self.affine.transform_point3(p)
    }

    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        self.affine.transform_vector3(v)
    }

    /// Map `(w*p, w)` to `(w*A(p), w)`.
    pub fn transform_homogeneous(&self, hp: HPoint) -> HPoint {
        let xyz = self.affine.matrix3 * hp.truncate() + self.affine.translation * hp.w;
        xyz.extend(hp.w)
    }

    /// Apply `self` first, then `other`.
    pub fn then(&self, other: &Transform) -> Transform {
        Self::from_affine(other.affine * self.affine)
    }

    pub fn inverse(&self) -> Option<Transform> {
        if self.affine.matrix3.determinant().abs() < 1e-15 {
            None
        } else {
            Some(Self::from_affine(self.affine.inverse()))
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homogeneous::{to_cartesian, to_homogeneous};
    use glam::dvec3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_homogeneous_matches_cartesian() {
        let t = Transform::from_axis_angle(dvec3(0.0, 0.0, 1.0), FRAC_PI_2)
            .then(&Transform::from_translation(dvec3(1.0, 2.0, 3.0)));
        let p = dvec3(1.0, 0.0, 0.0);
        let hp = to_homogeneous(p, 0.25);
        let (mapped, w) = to_cartesian(t.transform_homogeneous(hp)).unwrap();
        assert!((mapped - t.transform_point(p)).length() < 1e-12);
        assert!((mapped - dvec3(1.0, 3.0, 3.0)).length() < 1e-12);
        assert_eq!(w, 0.25);
    }

    #[test]
    fn test_inverse() {
        let t = Transform::from_scale(dvec3(2.0, 2.0, 2.0))
            .then(&Transform::from_translation(dvec3(10.0, 20.0, 30.0)));
        let inv = t.inverse().unwrap();
        let p = dvec3(1.0, 2.0, 3.0);
        let result = inv.transform_point(t.transform_point(p));
        assert!((result - p).length() < 1e-10);
        assert!(Transform::from_scale(dvec3(1.0, 0.0, 1.0)).inverse().is_none());
    }
}
