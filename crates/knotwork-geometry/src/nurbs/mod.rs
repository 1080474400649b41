//! NURBS core algorithms: knot vectors, basis functions, rational evaluation,
//! knot insertion, splitting, and Bezier decomposition.

pub mod basis;
pub mod decompose;
pub mod eval;
pub mod insert;
pub mod knot;
pub mod split;

use knotwork_core::{KnotworkError, Result};
use knotwork_math::HPoint;
use rayon::prelude::*;

pub use basis::{basis_functions, binomial, derivative_basis_functions};
pub use decompose::decompose_into_beziers;
pub use insert::{insert_knot, insert_knot_surface, refine_knots, refine_knots_surface};
pub use knot::{find_span, KnotVector};
pub use split::{split_curve, split_surface, Piece};

/// Parametric direction of a tensor-product surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    U,
    V,
}

/// Columns of a row-major control grid.
pub(crate) fn transpose(grid: &[Vec<HPoint>]) -> Vec<Vec<HPoint>> {
    let cols = grid.first().map_or(0, Vec::len);
    (0..cols)
        .map(|j| grid.iter().map(|row| row[j]).collect())
        .collect()
}

/// The control polygons running along `direction`: columns for U, rows for V.
pub(crate) fn lines_along(grid: &[Vec<HPoint>], direction: Direction) -> Vec<Vec<HPoint>> {
    match direction {
        Direction::U => transpose(grid),
        Direction::V => grid.to_vec(),
    }
}

/// Inverse of [`lines_along`].
pub(crate) fn grid_from_lines(lines: Vec<Vec<HPoint>>, direction: Direction) -> Vec<Vec<HPoint>> {
    match direction {
        Direction::U => transpose(&lines),
        Direction::V => lines,
    }
}

/// Apply a 1-D knot transform to every control polygon along `direction`.
///
/// Every line shares the same knot vector, so the transformed knots are
/// taken from the first line.
pub(crate) fn broadcast<F>(
    control_points: &[Vec<HPoint>],
    direction: Direction,
    f: F,
) -> Result<(KnotVector, Vec<Vec<HPoint>>)>
where
    F: Fn(&[HPoint]) -> Result<(KnotVector, Vec<HPoint>)> + Sync + Send,
{
    let results = lines_along(control_points, direction)
        .par_iter()
        .map(|line| f(line))
        .collect::<Result<Vec<_>>>()?;
    let knots = results
        .first()
        .map(|(knots, _)| knots.clone())
        .ok_or_else(|| KnotworkError::InvalidInput("empty control grid".into()))?;
    let lines = results.into_iter().map(|(_, line)| line).collect();
    Ok((knots, grid_from_lines(lines, direction)))
}
