//! Rational tensor-product (NURBS) surfaces.

use knotwork_core::traits::{ControlHullBounds, Validate};
use knotwork_core::{KnotworkError, Result};
use knotwork_math::homogeneous::to_homogeneous_grid;
use knotwork_math::{Aabb3, HPoint, Point3, Vector3};

use super::Surface;
use crate::curve::NurbsCurve;
use crate::nurbs::{self, eval, knot, lines_along, Direction, KnotVector};

/// A NURBS surface stored in homogeneous form.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and
/// column `j` (v-direction).
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsSurface {
    degree_u: usize,
    degree_v: usize,
    knots_u: KnotVector,
    knots_v: KnotVector,
    control_points: Vec<Vec<HPoint>>,
}

impl NurbsSurface {
    /// Build a surface from a cartesian control grid and optional weights.
    pub fn new(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<Point3>>,
        weights: Option<Vec<Vec<f64>>>,
    ) -> Result<Self> {
        let weights = weights.unwrap_or_else(|| {
            control_points
                .iter()
                .map(|row| vec![1.0; row.len()])
                .collect()
        });
        let homogeneous = to_homogeneous_grid(&control_points, &weights)?;
        Self::from_homogeneous(degree_u, degree_v, knots_u, knots_v, homogeneous)
    }

    /// Build a surface directly from a homogeneous control grid.
    pub fn from_homogeneous(
        degree_u: usize,
        degree_v: usize,
        knots_u: Vec<f64>,
        knots_v: Vec<f64>,
        control_points: Vec<Vec<HPoint>>,
    ) -> Result<Self> {
        let (rows, cols) = grid_shape(&control_points)?;
        let surface = Self {
            degree_u,
            degree_v,
            knots_u: KnotVector::try_new(knots_u, degree_u, rows)?,
            knots_v: KnotVector::try_new(knots_v, degree_v, cols)?,
            control_points,
        };
        surface.validate()?;
        Ok(surface)
    }

    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    pub fn degree_v(&self) -> usize {
        self.degree_v
    }

    pub fn knots_u(&self) -> &KnotVector {
        &self.knots_u
    }

    pub fn knots_v(&self) -> &KnotVector {
        &self.knots_v
    }

    pub fn control_points_homogeneous(&self) -> &[Vec<HPoint>] {
        &self.control_points
    }

    /// Cartesian control grid.
    pub fn control_points(&self) -> Vec<Vec<Point3>> {
        self.control_points
            .iter()
            .map(|row| row.iter().map(|hp| hp.truncate() / hp.w).collect())
            .collect()
    }

    pub fn weights(&self) -> Vec<Vec<f64>> {
        self.control_points
            .iter()
            .map(|row| row.iter().map(|hp| hp.w).collect())
            .collect()
    }

    pub fn domain_u(&self) -> (f64, f64) {
        self.knots_u.domain(self.degree_u)
    }

    pub fn domain_v(&self) -> (f64, f64) {
        self.knots_v.domain(self.degree_v)
    }

    pub fn point_at(&self, u: f64, v: f64) -> Result<Point3> {
        eval::surface_point(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        )
    }

    /// Mixed partials `S_{k,l}` for `k + l <= num_derivs`, indexed `[k][l]`.
    pub fn derivatives(&self, u: f64, v: f64, num_derivs: usize) -> Result<Vec<Vec<Vector3>>> {
        eval::surface_derivatives(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
            num_derivs,
        )
    }

    pub fn normal_at(&self, u: f64, v: f64) -> Result<Vector3> {
        eval::surface_normal(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.control_points,
            u,
            v,
        )
    }

    fn degree(&self, direction: Direction) -> usize {
        match direction {
            Direction::U => self.degree_u,
            Direction::V => self.degree_v,
        }
    }

    fn knots(&self, direction: Direction) -> &KnotVector {
        match direction {
            Direction::U => &self.knots_u,
            Direction::V => &self.knots_v,
        }
    }

    /// Copy with the knots of `direction` and the control grid replaced.
    fn with_knots(&self, direction: Direction, knots: KnotVector, control_points: Vec<Vec<HPoint>>) -> Self {
        let (knots_u, knots_v) = match direction {
            Direction::U => (knots, self.knots_v.clone()),
            Direction::V => (self.knots_u.clone(), knots),
        };
        Self {
            degree_u: self.degree_u,
            degree_v: self.degree_v,
            knots_u,
            knots_v,
            control_points,
        }
    }

    /// Insert `t` up to `times` times into the knots of `direction`.
    pub fn insert_knot(&self, direction: Direction, t: f64, times: usize) -> Result<Self> {
        let (knots, grid) = nurbs::insert_knot_surface(
            self.degree(direction),
            self.knots(direction),
            &self.control_points,
            direction,
            t,
            times,
        )?;
        Ok(self.with_knots(direction, knots, grid))
    }

    /// Insert every value of the sorted slice into the knots of `direction`.
    pub fn refine_knots(&self, direction: Direction, knots_to_insert: &[f64]) -> Result<Self> {
        let (knots, grid) = nurbs::refine_knots_surface(
            self.degree(direction),
            self.knots(direction),
            &self.control_points,
            direction,
            knots_to_insert,
        )?;
        Ok(self.with_knots(direction, knots, grid))
    }

    /// Split along `direction` at `t`. The split direction of each half is
    /// reparametrized to `[0, 1]`; the other direction keeps its knots.
    pub fn split(&self, direction: Direction, t: f64) -> Result<(Self, Self)> {
        let ((left_knots, left_grid), (right_knots, right_grid)) = nurbs::split_surface(
            self.degree(direction),
            self.knots(direction),
            &self.control_points,
            direction,
            t,
        )?;
        Ok((
            self.with_knots(direction, left_knots, left_grid),
            self.with_knots(direction, right_knots, right_grid),
        ))
    }

    /// The curve along `direction` with the other parameter fixed at `t`.
    ///
    /// `Direction::U` gives `C(u) = S(u, t)`; `Direction::V` gives
    /// `C(v) = S(t, v)`.
    pub fn isocurve(&self, direction: Direction, t: f64) -> Result<NurbsCurve> {
        // Collapse each polygon running across `direction` to one point.
        let (across, degree, knots) = match direction {
            Direction::U => (Direction::V, self.degree_u, &self.knots_u),
            Direction::V => (Direction::U, self.degree_v, &self.knots_v),
        };
        let fixed_degree = self.degree(across);
        let fixed_knots = self.knots(across);
        let control_points = lines_along(&self.control_points, across)
            .iter()
            .map(|line| eval::curve_point_homogeneous(fixed_degree, fixed_knots, line, t))
            .collect::<Result<Vec<_>>>()?;
        Ok(NurbsCurve::from_parts(degree, knots.clone(), control_points))
    }
}

fn grid_shape(control_points: &[Vec<HPoint>]) -> Result<(usize, usize)> {
    let rows = control_points.len();
    let cols = control_points.first().map_or(0, Vec::len);
    if rows == 0 || cols == 0 {
        return Err(KnotworkError::InvalidInput("empty control grid".into()));
    }
    if let Some(i) = control_points.iter().position(|row| row.len() != cols) {
        return Err(KnotworkError::InvalidInput(format!(
            "control grid row {} has {} points, expected {}",
            i,
            control_points[i].len(),
            cols
        )));
    }
    Ok((rows, cols))
}

impl Validate for NurbsSurface {
    fn validate(&self) -> Result<()> {
        let (rows, cols) = grid_shape(&self.control_points)?;
        knot::validate(self.knots_u.as_slice(), self.degree_u, rows)?;
        knot::validate(self.knots_v.as_slice(), self.degree_v, cols)?;
        match self
            .control_points
            .iter()
            .flatten()
            .find(|hp| !(hp.w.is_finite() && hp.w > 0.0))
        {
            Some(hp) => Err(KnotworkError::DegenerateWeight(hp.w)),
            None => Ok(()),
        }
    }
}

impl ControlHullBounds for NurbsSurface {
    type Bounds = Aabb3;

    fn control_hull_bounds(&self) -> Aabb3 {
        let points: Vec<Point3> = self.control_points().into_iter().flatten().collect();
        Aabb3::from_points(&points).unwrap_or_else(|| Aabb3::new(Point3::ZERO, Point3::ZERO))
    }
}

impl Surface for NurbsSurface {
    fn point_at(&self, u: f64, v: f64) -> Result<Point3> {
        NurbsSurface::point_at(self, u, v)
    }

    fn normal_at(&self, u: f64, v: f64) -> Result<Vector3> {
        NurbsSurface::normal_at(self, u, v)
    }

    fn domain_u(&self) -> (f64, f64) {
        NurbsSurface::domain_u(self)
    }

    fn domain_v(&self) -> (f64, f64) {
        NurbsSurface::domain_v(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knotwork_math::DVec3;

    fn bilinear_surface() -> NurbsSurface {
        NurbsSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)],
                vec![DVec3::new(0.0, 1.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
            ],
            None,
        )
        .unwrap()
    }

    /// Quarter cylinder of radius 1 and height 2; u runs around, v along z.
    fn quarter_cylinder() -> NurbsSurface {
        let w = 1.0_f64 / 2.0_f64.sqrt();
        let arc = [
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        ];
        NurbsSurface::new(
            2,
            1,
            vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            arc.iter()
                .map(|&p| vec![p, p + DVec3::new(0.0, 0.0, 2.0)])
                .collect(),
            Some(vec![vec![1.0, 1.0], vec![w, w], vec![1.0, 1.0]]),
        )
        .unwrap()
    }

    fn assert_same_surface(a: &NurbsSurface, b: &NurbsSurface) {
        let (u0, u1) = a.domain_u();
        let (v0, v1) = a.domain_v();
        for i in 0..=6 {
            for j in 0..=6 {
                let u = u0 + (u1 - u0) * i as f64 / 6.0;
                let v = v0 + (v1 - v0) * j as f64 / 6.0;
                let pa = a.point_at(u, v).unwrap();
                let pb = b.point_at(u, v).unwrap();
                assert!((pa - pb).length() < 1e-10, "mismatch at ({}, {})", u, v);
            }
        }
    }

    #[test]
    fn test_surface_corners() {
        let surf = bilinear_surface();
        assert!((surf.point_at(0.0, 0.0).unwrap() - DVec3::new(0.0, 0.0, 0.0)).length() < 1e-10);
        assert!((surf.point_at(1.0, 0.0).unwrap() - DVec3::new(0.0, 1.0, 0.0)).length() < 1e-10);
        assert!((surf.point_at(1.0, 1.0).unwrap() - DVec3::new(1.0, 1.0, 0.0)).length() < 1e-10);
        let n = surf.normal_at(0.5, 0.5).unwrap();
        assert!((n - DVec3::new(0.0, 0.0, -1.0)).length() < 1e-12);
    }

    #[test]
    fn test_cylinder_points_on_radius() {
        let surf = quarter_cylinder();
        for i in 0..=10 {
            for j in 0..=4 {
                let p = surf.point_at(i as f64 / 10.0, j as f64 / 4.0).unwrap();
                assert!(((p.x * p.x + p.y * p.y).sqrt() - 1.0).abs() < 1e-10);
                assert!((p.z - 2.0 * j as f64 / 4.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_insert_and_refine_preserve_shape() {
        let surf = quarter_cylinder();
        let inserted = surf.insert_knot(Direction::U, 0.3, 2).unwrap();
        assert_eq!(inserted.control_points_homogeneous().len(), 5);
        assert_eq!(inserted.knots_v(), surf.knots_v());
        assert_same_surface(&surf, &inserted);

        let refined = surf.refine_knots(Direction::V, &[0.25, 0.5, 0.5]).unwrap();
        assert_eq!(refined.control_points_homogeneous()[0].len(), 5);
        assert_eq!(refined.knots_u(), surf.knots_u());
        assert_same_surface(&surf, &refined);
    }

    #[test]
    fn test_split_halves_match_original() {
        let surf = quarter_cylinder();
        let (low, high) = surf.split(Direction::V, 0.25).unwrap();
        assert_eq!(low.domain_v(), (0.0, 1.0));
        assert_eq!(high.domain_v(), (0.0, 1.0));
        for i in 0..=8 {
            let u = i as f64 / 8.0;
            for j in 0..=4 {
                let s = j as f64 / 4.0;
                let expected_low = surf.point_at(u, 0.25 * s).unwrap();
                let expected_high = surf.point_at(u, 0.25 + 0.75 * s).unwrap();
                assert!((low.point_at(u, s).unwrap() - expected_low).length() < 1e-10);
                assert!((high.point_at(u, s).unwrap() - expected_high).length() < 1e-10);
            }
        }

        let (left, right) = surf.split(Direction::U, 0.5).unwrap();
        let seam = surf.point_at(0.5, 0.5).unwrap();
        assert!((left.point_at(1.0, 0.5).unwrap() - seam).length() < 1e-10);
        assert!((right.point_at(0.0, 0.5).unwrap() - seam).length() < 1e-10);
    }

    #[test]
    fn test_isocurves_lie_on_surface() {
        let surf = quarter_cylinder();
        let along_u = surf.isocurve(Direction::U, 0.4).unwrap();
        let along_v = surf.isocurve(Direction::V, 0.7).unwrap();
        assert_eq!(along_u.degree(), 2);
        assert_eq!(along_v.degree(), 1);
        for i in 0..=10 {
            let s = i as f64 / 10.0;
            assert!((along_u.point_at(s).unwrap() - surf.point_at(s, 0.4).unwrap()).length() < 1e-10);
            assert!((along_v.point_at(s).unwrap() - surf.point_at(0.7, s).unwrap()).length() < 1e-10);
        }
    }

    #[test]
    fn test_new_rejects_bad_grids() {
        let ragged = vec![vec![DVec3::ZERO, DVec3::X], vec![DVec3::Y]];
        assert!(NurbsSurface::new(1, 1, vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0], ragged, None).is_err());

        let grid = vec![vec![DVec3::ZERO, DVec3::X], vec![DVec3::Y, DVec3::ONE]];
        assert!(matches!(
            NurbsSurface::new(1, 1, vec![0.0, 0.0, 1.0], vec![0.0, 0.0, 1.0, 1.0], grid.clone(), None),
            Err(KnotworkError::InvalidKnotVector(_))
        ));
        assert!(matches!(
            NurbsSurface::new(
                1,
                1,
                vec![0.0, 0.0, 1.0, 1.0],
                vec![0.0, 0.0, 1.0, 1.0],
                grid,
                Some(vec![vec![1.0, 1.0], vec![0.0, 1.0]])
            ),
            Err(KnotworkError::DegenerateWeight(_))
        ));
        assert!(matches!(
            NurbsSurface::from_homogeneous(1, 1, vec![0.0, 0.0, 1.0, 1.0], vec![0.0, 0.0, 1.0, 1.0], vec![]),
            Err(KnotworkError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_control_hull_bounds() {
        let bounds = quarter_cylinder().control_hull_bounds();
        assert_eq!(bounds.min, DVec3::new(0.0, 0.0, 0.0));
        assert_eq!(bounds.max, DVec3::new(1.0, 1.0, 2.0));
    }
}
