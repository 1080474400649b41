//! Conversion between cartesian control points with weights and homogeneous
//! (weighted) control points.
//!
//! All batch conversions are element-wise and run on the rayon pool.

use knotwork_core::{KnotworkError, Result};
use rayon::prelude::*;

use crate::{HPoint, Point3};

/// Weights with a magnitude below this value cannot be divided out.
pub const DEGENERATE_WEIGHT: f64 = 1e-12;

/// Scale `point` by `weight` and append the weight.
pub fn to_homogeneous(point: Point3, weight: f64) -> HPoint {
    (point * weight).extend(weight)
}

/// Perspective division: recover the cartesian point and its weight.
pub fn to_cartesian(hp: HPoint) -> Result<(Point3, f64)> {
    let w = hp.w;
    if w.abs() < DEGENERATE_WEIGHT {
        return Err(KnotworkError::DegenerateWeight(w));
    }
    Ok((hp.truncate() / w, w))
}

pub fn to_homogeneous_batch(points: &[Point3], weights: &[f64]) -> Result<Vec<HPoint>> {
    if points.len() != weights.len() {
        return Err(KnotworkError::InvalidInput(format!(
            "{} points but {} weights",
            points.len(),
            weights.len()
        )));
    }
    Ok(points
        .par_iter()
        .zip(weights.par_iter())
        .map(|(&p, &w)| to_homogeneous(p, w))
        .collect())
}

pub fn to_cartesian_batch(points: &[HPoint]) -> Result<(Vec<Point3>, Vec<f64>)> {
    let pairs = points
        .par_iter()
        .map(|&hp| to_cartesian(hp))
        .collect::<Result<Vec<_>>>()?;
    Ok(pairs.into_iter().unzip())
}

/// Grid variant of [`to_homogeneous_batch`]; `points[i][j]` pairs with `weights[i][j]`.
pub fn to_homogeneous_grid(points: &[Vec<Point3>], weights: &[Vec<f64>]) -> Result<Vec<Vec<HPoint>>> {
    if points.len() != weights.len() {
        return Err(KnotworkError::InvalidInput(format!(
            "{} point rows but {} weight rows",
            points.len(),
            weights.len()
        )));
    }
    points
        .par_iter()
        .zip(weights.par_iter())
        .map(|(row, row_weights)| to_homogeneous_batch(row, row_weights))
        .collect()
}

pub fn to_cartesian_grid(points: &[Vec<HPoint>]) -> Result<(Vec<Vec<Point3>>, Vec<Vec<f64>>)> {
    let rows = points
        .par_iter()
        .map(|row| to_cartesian_batch(row))
        .collect::<Result<Vec<_>>>()?;
    Ok(rows.into_iter().unzip())
}
