//! Splitting curves and surfaces at a parameter.

use std::iter::repeat;

use knotwork_core::{KnotworkError, Result, Tolerance};
use knotwork_math::HPoint;
use log::debug;
use rayon::prelude::*;

use super::insert::insert_knot;
use super::knot::KnotVector;
use super::{grid_from_lines, lines_along, Direction};

/// Knot vector and homogeneous control points of one piece.
pub type Piece = (KnotVector, Vec<HPoint>);

/// Split a curve at `u` into two clamped pieces, each reparametrized to `[0, 1]`.
///
/// `u` is raised to multiplicity `degree` so the curve passes through a
/// control point there; that point ends the left piece and starts the right.
/// `u` must lie strictly inside the domain.
pub fn split_curve(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    u: f64,
) -> Result<(Piece, Piece)> {
    let (min, max) = knots.domain(degree);
    let u = knots.snap(u);
    if !(u > min && u < max) {
        return Err(KnotworkError::OutOfDomain { value: u, min, max });
    }

    let s = knots.multiplicity_of(u);
    let (knots, control_points) = if s < degree {
        insert_knot(degree, knots, control_points, u, degree - s)?
    } else {
        (knots.clone(), control_points.to_vec())
    };

    let kn = knots.as_slice();
    let m = knots.multiplicity_of(u);
    let first = kn
        .iter()
        .position(|&k| Tolerance::DEFAULT.param_eq(k, u))
        .ok_or_else(|| KnotworkError::Geometry(format!("split knot {} missing after insertion", u)))?;

    let left_knots: Vec<f64> = kn[..first]
        .iter()
        .copied()
        .chain(repeat(u).take(degree + 1))
        .collect();
    let left_points = control_points[..first].to_vec();

    // Multiplicity `degree` shares one control point, `degree + 1` shares none.
    let right_start = first + m - degree - 1;
    let right_knots: Vec<f64> = repeat(u)
        .take(degree + 1)
        .chain(kn[first + m..].iter().copied())
        .collect();
    let right_points = control_points[right_start..].to_vec();

    debug!(
        "split at {}: {} + {} control points",
        u,
        left_points.len(),
        right_points.len()
    );
    Ok((
        (KnotVector::new(left_knots).normalized(), left_points),
        (KnotVector::new(right_knots).normalized(), right_points),
    ))
}

/// Split a control grid along `direction` at `t`.
///
/// Returns the two knot vectors for that direction with their grids; the
/// other direction's knots are unchanged.
pub fn split_surface(
    degree: usize,
    knots: &KnotVector,
    control_points: &[Vec<HPoint>],
    direction: Direction,
    t: f64,
) -> Result<((KnotVector, Vec<Vec<HPoint>>), (KnotVector, Vec<Vec<HPoint>>))> {
    let pieces = lines_along(control_points, direction)
        .par_iter()
        .map(|line| split_curve(degree, knots, line, t))
        .collect::<Result<Vec<_>>>()?;

    let ((left_knots, _), (right_knots, _)) = pieces
        .first()
        .cloned()
        .ok_or_else(|| KnotworkError::InvalidInput("empty control grid".into()))?;
    let (left_lines, right_lines): (Vec<_>, Vec<_>) = pieces
        .into_iter()
        .map(|((_, left), (_, right))| (left, right))
        .unzip();

    Ok((
        (left_knots, grid_from_lines(left_lines, direction)),
        (right_knots, grid_from_lines(right_lines, direction)),
    ))
}
