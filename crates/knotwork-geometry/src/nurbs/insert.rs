//! Knot insertion and refinement (Boehm's algorithm).
//!
//! All blending happens on homogeneous control points; blending cartesian
//! points would not preserve a rational curve.

use knotwork_core::{KnotworkError, Result};
use knotwork_math::HPoint;
use log::debug;

use super::knot::{find_span, KnotVector, KNOT_EPS};
use super::{broadcast, Direction};

/// Insert `u` up to `times` times (Alg. A5.1).
///
/// With `s` the existing multiplicity of `u`, at most `degree - s` copies are
/// inserted. A knot that already has multiplicity `degree` or more is
/// saturated and rejected. The returned curve is geometrically identical to
/// the input.
pub fn insert_knot(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    u: f64,
    times: usize,
) -> Result<(KnotVector, Vec<HPoint>)> {
    if times == 0 {
        return Ok((knots.clone(), control_points.to_vec()));
    }

    let u = knots.snap(u);
    let (k, u) = knots.locate(degree, u)?;
    let s = knots.multiplicity_of(u);
    if s >= degree {
        return Err(KnotworkError::KnotSaturated {
            knot: u,
            multiplicity: s,
            degree,
        });
    }
    let r = times.min(degree - s);
    let p = degree;
    let np = control_points.len() - 1;
    let uk = knots.as_slice();

    let mut new_knots = Vec::with_capacity(uk.len() + r);
    new_knots.extend_from_slice(&uk[..=k]);
    new_knots.extend(std::iter::repeat(u).take(r));
    new_knots.extend_from_slice(&uk[k + 1..]);

    let mut q = vec![HPoint::ZERO; np + 1 + r];
    q[..=k - p].copy_from_slice(&control_points[..=k - p]);
    for i in k - s..=np {
        q[i + r] = control_points[i];
    }

    // Affected points, blended r times with a shrinking window
    let mut tmp: Vec<HPoint> = control_points[k - p..=k - s].to_vec();
    let mut l = 0;
    for j in 1..=r {
        l = k - p + j;
        for i in 0..=(p - j - s) {
            let alpha = (u - uk[l + i]) / (uk[i + k + 1] - uk[l + i]);
            tmp[i] = alpha * tmp[i + 1] + (1.0 - alpha) * tmp[i];
        }
        q[l] = tmp[0];
        q[k + r - j - s] = tmp[p - j - s];
    }
    for i in (l + 1)..(k - s) {
        q[i] = tmp[i - l];
    }

    debug!(
        "inserted knot {} x{} (multiplicity {} -> {}), {} -> {} control points",
        u,
        r,
        s,
        s + r,
        control_points.len(),
        q.len()
    );
    Ok((KnotVector::new(new_knots), q))
}

/// Insert a sorted batch of knots in one pass (Alg. A5.4).
///
/// Every value must lie in the domain, and no knot may end up with a
/// multiplicity above `degree + 1`.
pub fn refine_knots(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    knots_to_insert: &[f64],
) -> Result<(KnotVector, Vec<HPoint>)> {
    if knots_to_insert.is_empty() {
        return Ok((knots.clone(), control_points.to_vec()));
    }
    if knots_to_insert.windows(2).any(|w| w[1] < w[0]) {
        return Err(KnotworkError::InvalidInput(
            "knots to insert must be sorted".into(),
        ));
    }

    let x: Vec<f64> = knots_to_insert
        .iter()
        .map(|&v| knots.locate(degree, knots.snap(v)).map(|(_, v)| v))
        .collect::<Result<_>>()?;

    let inserted = KnotVector::new(x.clone());
    for (value, count) in inserted.distinct() {
        let existing = knots.multiplicity_of(value);
        if existing + count > degree + 1 {
            return Err(KnotworkError::KnotSaturated {
                knot: value,
                multiplicity: existing,
                degree,
            });
        }
    }

    let p = degree;
    let n = control_points.len() - 1;
    let m = n + p + 1;
    let r = x.len() - 1;
    let u = knots.as_slice();

    let a = find_span(p, u, n, x[0]);
    let b = find_span(p, u, n, x[r]) + 1;

    let mut q = vec![HPoint::ZERO; n + r + 2];
    let mut ubar = vec![0.0; m + r + 2];

    q[..=a - p].copy_from_slice(&control_points[..=a - p]);
    for j in (b - 1)..=n {
        q[j + r + 1] = control_points[j];
    }
    ubar[..=a].copy_from_slice(&u[..=a]);
    for j in (b + p)..=m {
        ubar[j + r + 1] = u[j];
    }

    let mut i = b + p - 1;
    let mut k = b + p + r;
    for j in (0..=r).rev() {
        while x[j] <= u[i] && i > a {
            q[k - p - 1] = control_points[i - p - 1];
            ubar[k] = u[i];
            k -= 1;
            i -= 1;
        }
        q[k - p - 1] = q[k - p];
        for l in 1..=p {
            let ind = k - p + l;
            let alpha = ubar[k + l] - x[j];
            if alpha.abs() <= KNOT_EPS {
                q[ind - 1] = q[ind];
            } else {
                let alpha = alpha / (ubar[k + l] - u[i - p + l]);
                q[ind - 1] = alpha * q[ind - 1] + (1.0 - alpha) * q[ind];
            }
        }
        ubar[k] = x[j];
        k -= 1;
    }

    debug!(
        "refined {} knots, {} -> {} control points",
        x.len(),
        control_points.len(),
        q.len()
    );
    Ok((KnotVector::new(ubar), q))
}

/// [`insert_knot`] applied along one direction of a control grid.
///
/// `Direction::U` inserts into `knots` as the u-knot vector and updates every
/// column; `Direction::V` updates every row.
pub fn insert_knot_surface(
    degree: usize,
    knots: &KnotVector,
    control_points: &[Vec<HPoint>],
    direction: Direction,
    t: f64,
    times: usize,
) -> Result<(KnotVector, Vec<Vec<HPoint>>)> {
    broadcast(control_points, direction, |line| {
        insert_knot(degree, knots, line, t, times)
    })
}

/// [`refine_knots`] applied along one direction of a control grid.
pub fn refine_knots_surface(
    degree: usize,
    knots: &KnotVector,
    control_points: &[Vec<HPoint>],
    direction: Direction,
    knots_to_insert: &[f64],
) -> Result<(KnotVector, Vec<Vec<HPoint>>)> {
    broadcast(control_points, direction, |line| {
        refine_knots(degree, knots, line, knots_to_insert)
    })
}
