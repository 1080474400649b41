//! Global curve interpolation through data points.

use knotwork_core::{KnotworkError, Result};
use knotwork_math::Point3;
use log::debug;
use nalgebra::{DMatrix, DVector};

use super::NurbsCurve;
use crate::nurbs::{basis_functions, find_span};

impl NurbsCurve {
    /// Non-rational curve of `degree` passing through every point of `points`.
    ///
    /// Uses chord-length parameters and averaged knots, then solves the
    /// collocation system `N * P = Q` by LU decomposition.
    pub fn interpolate(points: &[Point3], degree: usize) -> Result<Self> {
        let n = points.len();
        if degree == 0 || n < degree + 1 {
            return Err(KnotworkError::InvalidInput(format!(
                "degree {} interpolation needs at least {} points, got {}",
                degree,
                degree + 1,
                n
            )));
        }

        let params = chord_length_parameters(points)?;
        let knots = averaging_knot_vector(&params, degree);

        let mut matrix = DMatrix::<f64>::zeros(n, n);
        for (i, &t) in params.iter().enumerate() {
            let span = find_span(degree, &knots, n - 1, t);
            let basis = basis_functions(degree, &knots, span, t);
            for (j, &value) in basis.iter().enumerate() {
                matrix[(i, span - degree + j)] = value;
            }
        }

        let lu = matrix.lu();
        let mut control_points = vec![Point3::ZERO; n];
        for axis in 0..3 {
            let rhs = DVector::from_iterator(n, points.iter().map(|p| p[axis]));
            let solution = lu
                .solve(&rhs)
                .ok_or_else(|| KnotworkError::Geometry("singular interpolation system".into()))?;
            for (point, value) in control_points.iter_mut().zip(solution.iter()) {
                point[axis] = *value;
            }
        }

        debug!("interpolated {} points with a degree {} curve", n, degree);
        Self::new(degree, control_points, knots, None)
    }
}

/// Cumulative chord lengths normalized to `[0, 1]`.
fn chord_length_parameters(points: &[Point3]) -> Result<Vec<f64>> {
    let mut params = Vec::with_capacity(points.len());
    params.push(0.0);
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += pair[0].distance(pair[1]);
        params.push(total);
    }
    if total <= 0.0 {
        return Err(KnotworkError::InvalidInput(
            "interpolation points are all coincident".into(),
        ));
    }
    for t in &mut params {
        *t /= total;
    }
    Ok(params)
}

/// Clamped knots whose interior values average `degree` consecutive parameters.
fn averaging_knot_vector(params: &[f64], degree: usize) -> Vec<f64> {
    let n = params.len();
    let mut knots = vec![0.0; degree + 1];
    for j in 1..n - degree {
        knots.push(params[j..j + degree].iter().sum::<f64>() / degree as f64);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    knots
}
