//! Point and derivative evaluation for rational curves and surfaces.
//!
//! Evaluation runs on homogeneous control points, so the polynomial B-spline
//! machinery applies unchanged to rational geometry. Cartesian results are
//! recovered by perspective division, and derivatives by unwinding the
//! Leibniz rule `A^(k) = sum_i C(k,i) w^(i) C^(k-i)`.

use knotwork_core::{KnotworkError, Result};
use knotwork_math::homogeneous::{to_cartesian, DEGENERATE_WEIGHT};
use knotwork_math::{HPoint, Point3, Vector3};

use super::basis::{basis_functions, binomial, derivative_basis_functions};
use super::knot::KnotVector;

/// Below this length a derivative vector has no direction.
const ZERO_LENGTH: f64 = 1e-15;

/// Evaluate the homogeneous curve point at parameter `t`.
pub fn curve_point_homogeneous(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    t: f64,
) -> Result<HPoint> {
    let (span, t) = knots.locate(degree, t)?;
    let basis = basis_functions(degree, knots.as_slice(), span, t);

    let mut point = HPoint::ZERO;
    for (i, &b) in basis.iter().enumerate() {
        point += b * control_points[span - degree + i];
    }
    Ok(point)
}

/// Evaluate a rational curve point at parameter `t`.
pub fn curve_point(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    t: f64,
) -> Result<Point3> {
    let (point, _) = to_cartesian(curve_point_homogeneous(degree, knots, control_points, t)?)?;
    Ok(point)
}

/// Derivatives `0..=num_derivs` of the homogeneous curve at `t` (Alg. A3.2).
///
/// Orders above `degree` are zero.
pub fn curve_derivatives_homogeneous(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    t: f64,
    num_derivs: usize,
) -> Result<Vec<HPoint>> {
    let (span, t) = knots.locate(degree, t)?;
    let du = num_derivs.min(degree);
    let nders = derivative_basis_functions(degree, knots.as_slice(), span, t, du);

    let mut ders = vec![HPoint::ZERO; num_derivs + 1];
    for (k, row) in nders.iter().enumerate() {
        for (j, &n) in row.iter().enumerate() {
            ders[k] += n * control_points[span - degree + j];
        }
    }
    Ok(ders)
}

/// Cartesian derivatives from homogeneous ones (Alg. A4.2).
///
/// `C^(0) = A^(0) / w^(0)` and
/// `C^(k) = (A^(k) - sum_{i=1..k} C(k,i) w^(i) C^(k-i)) / w^(0)`.
pub fn rational_curve_derivatives(ders: &[HPoint]) -> Result<Vec<Vector3>> {
    let w0 = ders.first().map_or(0.0, |d| d.w);
    if w0.abs() < DEGENERATE_WEIGHT {
        return Err(KnotworkError::DegenerateWeight(w0));
    }

    let mut ck: Vec<Vector3> = Vec::with_capacity(ders.len());
    for k in 0..ders.len() {
        let mut v = ders[k].truncate();
        for i in 1..=k {
            v -= binomial(k, i) * ders[i].w * ck[k - i];
        }
        ck.push(v / w0);
    }
    Ok(ck)
}

/// Point and derivatives `1..=num_derivs` of a rational curve at `t`.
pub fn curve_derivatives(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    t: f64,
    num_derivs: usize,
) -> Result<Vec<Vector3>> {
    let ders = curve_derivatives_homogeneous(degree, knots, control_points, t, num_derivs)?;
    rational_curve_derivatives(&ders)
}

/// Unit tangent at `t`, or the zero vector where the first derivative vanishes.
pub fn curve_tangent(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
    t: f64,
) -> Result<Vector3> {
    let ders = curve_derivatives(degree, knots, control_points, t, 1)?;
    Ok(unit_or_zero(ders[1]))
}

/// Evaluate the homogeneous surface point at `(u, v)`.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and
/// column `j` (v-direction).
#[allow(clippy::too_many_arguments)]
pub fn surface_point_homogeneous(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
) -> Result<HPoint> {
    let (span_u, u) = knots_u.locate(degree_u, u)?;
    let (span_v, v) = knots_v.locate(degree_v, v)?;
    let basis_u = basis_functions(degree_u, knots_u.as_slice(), span_u, u);
    let basis_v = basis_functions(degree_v, knots_v.as_slice(), span_v, v);

    let mut point = HPoint::ZERO;
    for (i, &bu) in basis_u.iter().enumerate() {
        let row = &control_points[span_u - degree_u + i];
        let mut temp = HPoint::ZERO;
        for (j, &bv) in basis_v.iter().enumerate() {
            temp += bv * row[span_v - degree_v + j];
        }
        point += bu * temp;
    }
    Ok(point)
}

/// Evaluate a rational surface point at `(u, v)`.
#[allow(clippy::too_many_arguments)]
pub fn surface_point(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
) -> Result<Point3> {
    let hp = surface_point_homogeneous(degree_u, degree_v, knots_u, knots_v, control_points, u, v)?;
    let (point, _) = to_cartesian(hp)?;
    Ok(point)
}

/// Mixed partial derivatives of the homogeneous surface (Alg. A3.6).
///
/// `skl[k][l]` is the derivative taken `k` times in u and `l` times in v,
/// filled for `k + l <= num_derivs`.
#[allow(clippy::too_many_arguments)]
pub fn surface_derivatives_homogeneous(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
    num_derivs: usize,
) -> Result<Vec<Vec<HPoint>>> {
    let (span_u, u) = knots_u.locate(degree_u, u)?;
    let (span_v, v) = knots_v.locate(degree_v, v)?;
    let du = num_derivs.min(degree_u);
    let dv = num_derivs.min(degree_v);
    let nu = derivative_basis_functions(degree_u, knots_u.as_slice(), span_u, u, du);
    let nv = derivative_basis_functions(degree_v, knots_v.as_slice(), span_v, v, dv);

    let mut skl = vec![vec![HPoint::ZERO; num_derivs + 1]; num_derivs + 1];
    let mut temp = vec![HPoint::ZERO; degree_v + 1];

    for k in 0..=du {
        for (s, slot) in temp.iter_mut().enumerate() {
            *slot = HPoint::ZERO;
            for r in 0..=degree_u {
                *slot += nu[k][r] * control_points[span_u - degree_u + r][span_v - degree_v + s];
            }
        }
        let dd = (num_derivs - k).min(dv);
        for l in 0..=dd {
            for (s, &t) in temp.iter().enumerate() {
                skl[k][l] += nv[l][s] * t;
            }
        }
    }
    Ok(skl)
}

/// Cartesian surface derivatives from homogeneous ones (Alg. A4.4).
pub fn rational_surface_derivatives(skl: &[Vec<HPoint>]) -> Result<Vec<Vec<Vector3>>> {
    let d = skl.len().saturating_sub(1);
    let w00 = skl.first().and_then(|row| row.first()).map_or(0.0, |p| p.w);
    if w00.abs() < DEGENERATE_WEIGHT {
        return Err(KnotworkError::DegenerateWeight(w00));
    }

    let mut out = vec![vec![Vector3::ZERO; d + 1]; d + 1];
    for k in 0..=d {
        for l in 0..=(d - k) {
            let mut v = skl[k][l].truncate();
            for j in 1..=l {
                v -= binomial(l, j) * skl[0][j].w * out[k][l - j];
            }
            for i in 1..=k {
                v -= binomial(k, i) * skl[i][0].w * out[k - i][l];
                let mut v2 = Vector3::ZERO;
                for j in 1..=l {
                    v2 += binomial(l, j) * skl[i][j].w * out[k - i][l - j];
                }
                v -= binomial(k, i) * v2;
            }
            out[k][l] = v / w00;
        }
    }
    Ok(out)
}

/// Cartesian mixed partials `S_{k,l}` of a rational surface for `k + l <= num_derivs`.
#[allow(clippy::too_many_arguments)]
pub fn surface_derivatives(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
    num_derivs: usize,
) -> Result<Vec<Vec<Vector3>>> {
    let skl = surface_derivatives_homogeneous(
        degree_u,
        degree_v,
        knots_u,
        knots_v,
        control_points,
        u,
        v,
        num_derivs,
    )?;
    rational_surface_derivatives(&skl)
}

/// Unit normal `S_u x S_v`, or the zero vector at a degenerate point.
#[allow(clippy::too_many_arguments)]
pub fn surface_normal(
    degree_u: usize,
    degree_v: usize,
    knots_u: &KnotVector,
    knots_v: &KnotVector,
    control_points: &[Vec<HPoint>],
    u: f64,
    v: f64,
) -> Result<Vector3> {
    let ders = surface_derivatives(degree_u, degree_v, knots_u, knots_v, control_points, u, v, 1)?;
    Ok(unit_or_zero(ders[1][0].cross(ders[0][1])))
}

fn unit_or_zero(v: Vector3) -> Vector3 {
    let len = v.length();
    if len < ZERO_LENGTH {
        Vector3::ZERO
    } else {
        v / len
    }
}
