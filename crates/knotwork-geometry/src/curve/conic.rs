//! Circular and elliptical arcs as rational quadratic curves.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use knotwork_core::{KnotworkError, Result};
use knotwork_math::{Point3, Ray, Vector3};

use super::NurbsCurve;

impl NurbsCurve {
    /// Elliptical arc from `start_angle` to `end_angle` (radians) in the frame
    /// spanned by `x_axis` and `y_axis`.
    ///
    /// The sweep is split into at most four rational quadratic pieces of equal
    /// angle, none wider than 90 degrees (Piegl & Tiller A7.1). Each middle
    /// control point is where the end tangents of its piece meet, at
    /// `center + x·cos(mid) + y·sin(mid)` scaled by `1 / cos(step / 2)`, and
    /// carries weight `cos(step / 2)`.
    ///
    /// Parallel axes give no plane to sweep in and fail with `DegenerateRays`.
    #[allow(clippy::too_many_arguments)]
    pub fn ellipse_arc(
        center: Point3,
        x_axis: Vector3,
        y_axis: Vector3,
        x_radius: f64,
        y_radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Self> {
        for radius in [x_radius, y_radius] {
            if !(radius.is_finite() && radius > 0.0) {
                return Err(KnotworkError::InvalidInput(format!(
                    "arc radius must be positive, got {}",
                    radius
                )));
            }
        }
        let sweep = end_angle - start_angle;
        if !(sweep > 0.0 && sweep <= TAU + f64::EPSILON) {
            return Err(KnotworkError::InvalidInput(format!(
                "arc sweep must lie in (0, 2pi], got {}",
                sweep
            )));
        }
        let x_axis = x_axis.normalize_or_zero() * x_radius;
        let y_axis = y_axis.normalize_or_zero() * y_radius;
        if x_axis == Vector3::ZERO || y_axis == Vector3::ZERO {
            return Err(KnotworkError::InvalidInput("arc axes must be non-zero".into()));
        }
        if Ray::new(center, x_axis).intersect(&Ray::new(center, y_axis)).is_none() {
            return Err(KnotworkError::DegenerateRays);
        }

        let num_arcs = if sweep <= FRAC_PI_2 {
            1
        } else if sweep <= PI {
            2
        } else if sweep <= 3.0 * FRAC_PI_2 {
            3
        } else {
            4
        };
        let step = sweep / num_arcs as f64;
        let middle_weight = (step / 2.0).cos();

        let radial = |angle: f64| x_axis * angle.cos() + y_axis * angle.sin();

        let mut points = Vec::with_capacity(2 * num_arcs + 1);
        let mut weights = Vec::with_capacity(2 * num_arcs + 1);
        points.push(center + radial(start_angle));
        weights.push(1.0);

        for i in 1..=num_arcs {
            let angle = start_angle + step * i as f64;
            let mid = angle - step / 2.0;
            points.push(center + radial(mid) / middle_weight);
            weights.push(middle_weight);
            points.push(center + radial(angle));
            weights.push(1.0);
        }

        let mut knots = vec![0.0; 3];
        for i in 1..num_arcs {
            let k = i as f64 / num_arcs as f64;
            knots.extend([k, k]);
        }
        knots.extend([1.0; 3]);

        Self::new(2, points, knots, Some(weights))
    }

    /// Circular arc of `radius` from `start_angle` to `end_angle`.
    pub fn arc(
        center: Point3,
        x_axis: Vector3,
        y_axis: Vector3,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    ) -> Result<Self> {
        Self::ellipse_arc(center, x_axis, y_axis, radius, radius, start_angle, end_angle)
    }

    /// Full circle starting on `x_axis`.
    pub fn circle(center: Point3, x_axis: Vector3, y_axis: Vector3, radius: f64) -> Result<Self> {
        Self::arc(center, x_axis, y_axis, radius, 0.0, TAU)
    }
}
