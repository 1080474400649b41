//! Rational B-spline (NURBS) curves.

use knotwork_core::traits::{ControlHullBounds, Validate};
use knotwork_core::{KnotworkError, Result, Tolerance};
use knotwork_math::homogeneous::{to_homogeneous, to_homogeneous_batch};
use knotwork_math::{Aabb3, HPoint, Point3, Transform, Vector3};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::Curve;
use crate::length::ArcLengthTable;
use crate::nurbs::{self, eval, knot, KnotVector};
use crate::tessellate::{adaptive_sample, regular_sample, SamplingOptions};

/// A NURBS curve stored in homogeneous form.
///
/// Control point `i` is kept as `(w_i * P_i, w_i)`. A polynomial B-spline is
/// the special case with every weight equal to one.
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsCurve {
    degree: usize,
    knots: KnotVector,
    control_points: Vec<HPoint>,
}

impl NurbsCurve {
    /// Build a curve from cartesian control points and optional weights.
    ///
    /// Missing weights default to one. Weights must be positive and finite.
    pub fn new(
        degree: usize,
        control_points: Vec<Point3>,
        knots: Vec<f64>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self> {
        let weights = weights.unwrap_or_else(|| vec![1.0; control_points.len()]);
        check_weights(&weights)?;
        let homogeneous = to_homogeneous_batch(&control_points, &weights)?;
        Self::from_homogeneous(degree, knots, homogeneous)
    }

    /// Build a curve directly from homogeneous control points.
    pub fn from_homogeneous(
        degree: usize,
        knots: Vec<f64>,
        control_points: Vec<HPoint>,
    ) -> Result<Self> {
        let curve = Self {
            degree,
            knots: KnotVector::try_new(knots, degree, control_points.len())?,
            control_points,
        };
        curve.validate()?;
        Ok(curve)
    }

    /// Single-segment curve of degree `points.len() - 1`.
    pub fn bezier(points: Vec<Point3>, weights: Option<Vec<f64>>) -> Result<Self> {
        if points.len() < 2 {
            return Err(KnotworkError::InvalidInput(
                "a bezier curve needs at least 2 control points".into(),
            ));
        }
        let degree = points.len() - 1;
        let knots = KnotVector::clamped_uniform(degree, points.len()).into_vec();
        Self::new(degree, points, knots, weights)
    }

    /// Straight segment from `start` to `end` on `[0, 1]`.
    pub fn line(start: Point3, end: Point3) -> Self {
        Self {
            degree: 1,
            knots: KnotVector::new(vec![0.0, 0.0, 1.0, 1.0]),
            control_points: vec![to_homogeneous(start, 1.0), to_homogeneous(end, 1.0)],
        }
    }

    /// Assemble a curve from parts produced by the kernel's own transforms.
    pub(crate) fn from_parts(degree: usize, knots: KnotVector, control_points: Vec<HPoint>) -> Self {
        Self {
            degree,
            knots,
            control_points,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &KnotVector {
        &self.knots
    }

    pub fn control_points_homogeneous(&self) -> &[HPoint] {
        &self.control_points
    }

    /// Cartesian control points.
    pub fn control_points(&self) -> Vec<Point3> {
        self.control_points
            .iter()
            .map(|hp| hp.truncate() / hp.w)
            .collect()
    }

    pub fn weights(&self) -> Vec<f64> {
        self.control_points.iter().map(|hp| hp.w).collect()
    }

    pub fn domain(&self) -> (f64, f64) {
        self.knots.domain(self.degree)
    }

    /// A curve whose knot vector has a single non-empty span.
    pub fn is_bezier(&self) -> bool {
        self.knots.distinct().len() == 2
    }

    pub fn point_at(&self, t: f64) -> Result<Point3> {
        eval::curve_point(self.degree, &self.knots, &self.control_points, t)
    }

    /// Point followed by derivatives up to order `num_derivs` at `t`.
    pub fn derivatives(&self, t: f64, num_derivs: usize) -> Result<Vec<Vector3>> {
        eval::curve_derivatives(self.degree, &self.knots, &self.control_points, t, num_derivs)
    }

    pub fn tangent_at(&self, t: f64) -> Result<Vector3> {
        eval::curve_tangent(self.degree, &self.knots, &self.control_points, t)
    }

    /// Insert `u` up to `times` times; see [`nurbs::insert_knot`].
    pub fn insert_knot(&self, u: f64, times: usize) -> Result<Self> {
        let (knots, control_points) =
            nurbs::insert_knot(self.degree, &self.knots, &self.control_points, u, times)?;
        Ok(Self::from_parts(self.degree, knots, control_points))
    }

    /// Insert every value of the sorted slice `knots_to_insert`.
    pub fn refine_knots(&self, knots_to_insert: &[f64]) -> Result<Self> {
        let (knots, control_points) =
            nurbs::refine_knots(self.degree, &self.knots, &self.control_points, knots_to_insert)?;
        Ok(Self::from_parts(self.degree, knots, control_points))
    }

    /// Split at an interior parameter into two curves on `[0, 1]`.
    pub fn split(&self, u: f64) -> Result<(Self, Self)> {
        let ((left_knots, left_points), (right_knots, right_points)) =
            nurbs::split_curve(self.degree, &self.knots, &self.control_points, u)?;
        Ok((
            Self::from_parts(self.degree, left_knots, left_points),
            Self::from_parts(self.degree, right_knots, right_points),
        ))
    }

    /// Bezier segments covering the curve, each keeping the global parameters.
    pub fn decompose_into_beziers(&self) -> Result<Vec<Self>> {
        Ok(
            nurbs::decompose_into_beziers(self.degree, &self.knots, &self.control_points)?
                .into_iter()
                .map(|(knots, control_points)| Self::from_parts(self.degree, knots, control_points))
                .collect(),
        )
    }

    /// Total arc length.
    ///
    /// This and the other arc-length methods build a fresh [`ArcLengthTable`]
    /// on every call. Build the table once for repeated queries.
    pub fn length(&self) -> Result<f64> {
        Ok(ArcLengthTable::new(self)?.total_length())
    }

    /// Arc length from the domain start to `u`. See [`NurbsCurve::length`].
    pub fn length_at(&self, u: f64) -> Result<f64> {
        ArcLengthTable::new(self)?.length_at(u)
    }

    /// Parameter at which the arc length from the start reaches `length`.
    /// See [`NurbsCurve::length`].
    pub fn param_at_length(&self, length: f64, tolerance: f64) -> Result<f64> {
        ArcLengthTable::new(self)?.param_at_length(length, tolerance)
    }

    /// Adaptive polyline; straight curves return their control points.
    pub fn tessellate(&self, options: &SamplingOptions) -> Result<Vec<Point3>> {
        if self.degree == 1 {
            return Ok(self.control_points());
        }
        let mut rng = StdRng::seed_from_u64(options.seed);
        adaptive_sample(self, options, &mut rng)
    }

    /// `count` samples at uniformly spaced parameters.
    pub fn regular_sample(&self, count: usize) -> Result<Vec<(f64, Point3)>> {
        regular_sample(self, count)
    }

    /// The same point set traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            degree: self.degree,
            knots: self.knots.reversed(),
            control_points: self.control_points.iter().rev().copied().collect(),
        }
    }

    /// Apply an affine map. Rational curves are affinely invariant, so only
    /// the control points move.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            degree: self.degree,
            knots: self.knots.clone(),
            control_points: self
                .control_points
                .iter()
                .map(|&hp| transform.transform_homogeneous(hp))
                .collect(),
        }
    }
}

fn check_weights(weights: &[f64]) -> Result<()> {
    match weights.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        Some(&w) => Err(KnotworkError::DegenerateWeight(w)),
        None => Ok(()),
    }
}

impl Validate for NurbsCurve {
    fn validate(&self) -> Result<()> {
        knot::validate(self.knots.as_slice(), self.degree, self.control_points.len())?;
        check_weights(&self.weights())
    }
}

impl ControlHullBounds for NurbsCurve {
    type Bounds = Aabb3;

    fn control_hull_bounds(&self) -> Aabb3 {
        let points = self.control_points();
        Aabb3::from_points(&points).unwrap_or_else(|| Aabb3::new(Point3::ZERO, Point3::ZERO))
    }
}

impl Curve for NurbsCurve {
    fn point_at(&self, t: f64) -> Result<Point3> {
        NurbsCurve::point_at(self, t)
    }

    fn tangent_at(&self, t: f64) -> Result<Vector3> {
        NurbsCurve::tangent_at(self, t)
    }

    fn domain(&self) -> (f64, f64) {
        NurbsCurve::domain(self)
    }

    fn is_closed(&self) -> bool {
        let (start, end) = self.domain();
        match (self.point_at(start), self.point_at(end)) {
            (Ok(a), Ok(b)) => Tolerance::DEFAULT.is_zero(a.distance(b)),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_math::DVec3;

    fn unit_circle() -> NurbsCurve {
        let w = 1.0_f64 / 2.0_f64.sqrt();
        NurbsCurve::new(
            2,
            vec![
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(1.0, 1.0, 0.0),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(-1.0, 1.0, 0.0),
                DVec3::new(-1.0, 0.0, 0.0),
                DVec3::new(-1.0, -1.0, 0.0),
                DVec3::new(0.0, -1.0, 0.0),
                DVec3::new(1.0, -1.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
            ],
            vec![0.0, 0.0, 0.0, 0.25, 0.25, 0.5, 0.5, 0.75, 0.75, 1.0, 1.0, 1.0],
            Some(vec![1.0, w, 1.0, w, 1.0, w, 1.0, w, 1.0]),
        )
        .unwrap()
    }

    #[test]
    fn test_bezier_quadratic() {
        let curve = NurbsCurve::bezier(
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(0.5, 1.0, 0.0),
                DVec3::new(1.0, 0.0, 0.0),
            ],
            None,
        )
        .unwrap();
        assert!(curve.is_bezier());

        // Endpoints should interpolate
        assert!((curve.point_at(0.0).unwrap() - DVec3::ZERO).length() < 1e-10);
        assert!((curve.point_at(1.0).unwrap() - DVec3::X).length() < 1e-10);

        // 0.25*P0 + 0.5*P1 + 0.25*P2
        let pm = curve.point_at(0.5).unwrap();
        assert!((pm - DVec3::new(0.5, 0.5, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_domain() {
        let curve = NurbsCurve::new(
            2,
            vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z, DVec3::ONE],
            vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 3.0, 3.0],
            None,
        )
        .unwrap();
        assert_eq!(curve.domain(), (0.0, 3.0));
        assert!(!curve.is_bezier());
    }

    #[test]
    fn test_nurbs_circle() {
        let curve = unit_circle();
        let (t_min, t_max) = curve.domain();
        for i in 0..=20 {
            let t = t_min + (t_max - t_min) * i as f64 / 20.0;
            let p = curve.point_at(t).unwrap();
            let r = (p.x * p.x + p.y * p.y).sqrt();
            assert!(
                (r - 1.0).abs() < 1e-8,
                "NURBS circle point at t={} has radius {}, expected 1.0",
                t,
                r
            );
            assert!(p.z.abs() < 1e-10);
        }
        assert!(Curve::is_closed(&curve));
    }

    #[test]
    fn test_line_tangent_direction() {
        let curve = NurbsCurve::line(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0));
        let t = curve.tangent_at(0.5).unwrap();
        assert!((t - DVec3::X).length() < 1e-12);
        assert!(!Curve::is_closed(&curve));
    }

    #[test]
    fn test_new_rejects_bad_input() {
        let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
        let knots = vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        assert!(matches!(
            NurbsCurve::new(2, points.clone(), vec![0.0, 0.0, 1.0, 1.0, 1.0, 1.0], None),
            Err(KnotworkError::InvalidKnotVector(_))
        ));
        assert!(matches!(
            NurbsCurve::new(2, points.clone(), knots.clone(), Some(vec![1.0, 1.0])),
            Err(KnotworkError::InvalidInput(_))
        ));
        assert!(matches!(
            NurbsCurve::new(2, points.clone(), knots.clone(), Some(vec![1.0, 0.0, 1.0])),
            Err(KnotworkError::DegenerateWeight(_))
        ));
        assert!(matches!(
            NurbsCurve::new(2, points, knots, Some(vec![1.0, -2.0, 1.0])),
            Err(KnotworkError::DegenerateWeight(_))
        ));
        assert!(matches!(
            NurbsCurve::bezier(vec![DVec3::ZERO], None),
            Err(KnotworkError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_accessors_round_trip_weights() {
        let curve = unit_circle();
        let rebuilt = NurbsCurve::new(
            curve.degree(),
            curve.control_points(),
            curve.knots().as_slice().to_vec(),
            Some(curve.weights()),
        )
        .unwrap();
        for (a, b) in rebuilt
            .control_points_homogeneous()
            .iter()
            .zip(curve.control_points_homogeneous())
        {
            assert!((*a - *b).length() < 1e-12);
        }
    }

    #[test]
    fn test_reversed_traverses_backwards() {
        let curve = unit_circle();
        let reversed = curve.reversed();
        assert_eq!(reversed.domain(), curve.domain());
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let a = curve.point_at(t).unwrap();
            let b = reversed.point_at(1.0 - t).unwrap();
            assert!((a - b).length() < 1e-10);
        }
    }

    #[test]
    fn test_transformed_matches_transformed_points() {
        let curve = unit_circle();
        let transform = Transform::from_axis_angle(DVec3::Z, 0.3)
            .then(&Transform::from_translation(DVec3::new(1.0, -2.0, 3.0)));
        let moved = curve.transformed(&transform);
        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let expected = transform.transform_point(curve.point_at(t).unwrap());
            assert!((moved.point_at(t).unwrap() - expected).length() < 1e-10);
        }
        assert_eq!(moved.weights(), curve.weights());
    }

    #[test]
    fn test_control_hull_bounds_enclose_curve() {
        let curve = unit_circle();
        let bounds = curve.control_hull_bounds().expand(1e-12);
        for i in 0..=32 {
            let p = curve.point_at(i as f64 / 32.0).unwrap();
            assert!(bounds.contains_point(p));
        }
        assert_eq!(bounds.min.x, -1.0 - 1e-12);
    }

    #[test]
    fn test_transforms_return_new_curves() {
        let curve = unit_circle();
        let refined = curve.refine_knots(&[0.1, 0.6]).unwrap();
        assert_eq!(refined.control_points_homogeneous().len(), 11);
        assert_eq!(curve.control_points_homogeneous().len(), 9);

        let (left, right) = curve.split(0.5).unwrap();
        assert!((left.point_at(1.0).unwrap() - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-10);
        assert!((right.point_at(0.0).unwrap() - DVec3::new(-1.0, 0.0, 0.0)).length() < 1e-10);

        let segments = curve.decompose_into_beziers().unwrap();
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(NurbsCurve::is_bezier));
    }
}
