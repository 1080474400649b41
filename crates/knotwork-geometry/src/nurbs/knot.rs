//! Knot vectors: validation, multiplicity queries, and span location.

use std::ops::Index;

use knotwork_core::{KnotworkError, Result, Tolerance};

/// Two knots closer than this are the same knot.
pub const KNOT_EPS: f64 = Tolerance::DEFAULT_PARAMETRIC;

fn same_knot(a: f64, b: f64) -> bool {
    Tolerance::DEFAULT.param_eq(a, b)
}

/// A clamped, non-decreasing knot vector.
///
/// Construct with [`KnotVector::try_new`] to validate against a degree and
/// control point count; [`KnotVector::new`] is for vectors produced by the
/// kernel's own transforms, which preserve the invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct KnotVector {
    knots: Vec<f64>,
}

impl KnotVector {
    pub fn new(knots: Vec<f64>) -> Self {
        Self { knots }
    }

    pub fn try_new(knots: Vec<f64>, degree: usize, control_point_count: usize) -> Result<Self> {
        validate(&knots, degree, control_point_count)?;
        Ok(Self { knots })
    }

    /// Clamped knot vector on `[0, 1]` with uniformly spaced interior knots.
    pub fn clamped_uniform(degree: usize, control_point_count: usize) -> Self {
        let interior = control_point_count.saturating_sub(degree + 1);
        let mut knots = Vec::with_capacity(control_point_count + degree + 1);
        knots.extend(std::iter::repeat(0.0).take(degree + 1));
        knots.extend((1..=interior).map(|i| i as f64 / (interior + 1) as f64));
        knots.extend(std::iter::repeat(1.0).take(degree + 1));
        Self { knots }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.knots
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.knots
    }

    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.knots[0]
    }

    pub fn last(&self) -> f64 {
        self.knots[self.knots.len() - 1]
    }

    /// Parameter domain `(u_min, u_max)` for a curve of the given degree.
    pub fn domain(&self, degree: usize) -> (f64, f64) {
        (self.knots[degree], self.knots[self.knots.len() - degree - 1])
    }

    /// Number of consecutive repeats of `knots[index]`, counted forward from `index`.
    pub fn multiplicity(&self, index: usize) -> usize {
        let Some(&value) = self.knots.get(index) else {
            return 0;
        };
        self.knots[index..]
            .iter()
            .take_while(|&&k| same_knot(k, value))
            .count()
    }

    /// Number of knots equal to `u`.
    pub fn multiplicity_of(&self, u: f64) -> usize {
        self.knots.iter().filter(|&&k| same_knot(k, u)).count()
    }

    /// Distinct knot values with their multiplicities, in order.
    pub fn distinct(&self) -> Vec<(f64, usize)> {
        let mut out: Vec<(f64, usize)> = Vec::new();
        for &k in &self.knots {
            match out.last_mut() {
                Some((value, count)) if same_knot(k, *value) => *count += 1,
                _ => out.push((k, 1)),
            }
        }
        out
    }

    /// Distinct values strictly between the first and last knot.
    pub fn interior_distinct(&self) -> Vec<(f64, usize)> {
        let mut distinct = self.distinct();
        if distinct.len() <= 2 {
            return Vec::new();
        }
        distinct.pop();
        distinct.remove(0);
        distinct
    }

    /// Replace `u` by an existing knot within [`KNOT_EPS`], if there is one.
    pub fn snap(&self, u: f64) -> f64 {
        self.knots
            .iter()
            .copied()
            .find(|&k| same_knot(k, u))
            .unwrap_or(u)
    }

    /// Locate the span of `u`, returning `(span, u)` with `u` snapped onto the
    /// domain when it lies within [`KNOT_EPS`] of a boundary.
    pub fn locate(&self, degree: usize, u: f64) -> Result<(usize, f64)> {
        let (min, max) = self.domain(degree);
        if u.is_nan() || u < min - KNOT_EPS || u > max + KNOT_EPS {
            return Err(KnotworkError::OutOfDomain { value: u, min, max });
        }
        let u = u.clamp(min, max);
        let n = self.knots.len() - degree - 2;
        Ok((find_span(degree, &self.knots, n, u), u))
    }

    /// Affinely remap the knots onto `[start, end]`.
    pub fn reparametrized(&self, start: f64, end: f64) -> Self {
        let first = self.first();
        let last = self.last();
        let scale = (end - start) / (last - first);
        let knots = self
            .knots
            .iter()
            .map(|&k| {
                if k == last {
                    end
                } else {
                    start + (k - first) * scale
                }
            })
            .collect();
        Self { knots }
    }

    pub fn normalized(&self) -> Self {
        self.reparametrized(0.0, 1.0)
    }

    /// Knot vector of the reversed parametrization `u -> first + last - u`.
    pub fn reversed(&self) -> Self {
        let sum = self.first() + self.last();
        Self {
            knots: self.knots.iter().rev().map(|&k| sum - k).collect(),
        }
    }
}

impl Index<usize> for KnotVector {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.knots[index]
    }
}

/// Check a knot vector against a degree and control point count.
///
/// Requires `m == n + degree + 1`, non-decreasing knots, exactly
/// `degree + 1` repeats at each end, and no interior knot repeated more than
/// `degree + 1` times.
pub fn validate(knots: &[f64], degree: usize, control_point_count: usize) -> Result<()> {
    let invalid = |msg: String| Err(KnotworkError::InvalidKnotVector(msg));

    if degree == 0 {
        return invalid("degree must be at least 1".into());
    }
    if control_point_count < degree + 1 {
        return invalid(format!(
            "{} control points cannot define a curve of degree {}",
            control_point_count, degree
        ));
    }
    let m = knots.len();
    if m != control_point_count + degree + 1 {
        return invalid(format!(
            "expected {} knots for {} control points of degree {}, got {}",
            control_point_count + degree + 1,
            control_point_count,
            degree,
            m
        ));
    }
    if let Some(i) = knots.iter().position(|k| !k.is_finite()) {
        return invalid(format!("knot {} is not finite", i));
    }
    if let Some(i) = knots.windows(2).position(|w| w[1] < w[0] - KNOT_EPS) {
        return invalid(format!("knots decrease at index {}", i + 1));
    }

    let first = knots[0];
    let last = knots[m - 1];
    if knots[..=degree].iter().any(|&k| !same_knot(k, first)) {
        return invalid(format!("first {} knots are not equal", degree + 1));
    }
    if knots[m - degree - 1..].iter().any(|&k| !same_knot(k, last)) {
        return invalid(format!("last {} knots are not equal", degree + 1));
    }
    if knots[degree + 1] - first <= KNOT_EPS || last - knots[m - degree - 2] <= KNOT_EPS {
        return invalid(format!(
            "end knots must repeat exactly {} times over a non-empty domain",
            degree + 1
        ));
    }

    let kv = KnotVector::new(knots.to_vec());
    if let Some((value, mult)) = kv
        .interior_distinct()
        .into_iter()
        .find(|&(_, mult)| mult > degree + 1)
    {
        return invalid(format!(
            "interior knot {} has multiplicity {} > {}",
            value,
            mult,
            degree + 1
        ));
    }
    Ok(())
}

/// Find the knot span index for parameter `t` in the knot vector.
///
/// Returns the index `i` such that `knots[i] <= t < knots[i+1]`,
/// with special handling for the boundaries.
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `n` - Number of control points minus 1
/// * `t` - Parameter value, already inside the domain
pub fn find_span(degree: usize, knots: &[f64], n: usize, t: f64) -> usize {
    if t >= knots[n + 1] {
        return n;
    }
    if t <= knots[degree] {
        return degree;
    }

    let mut low = degree;
    let mut high = n + 1;
    let mut mid = (low + high) / 2;

    while t < knots[mid] || t >= knots[mid + 1] {
        if t < knots[mid] {
            high = mid;
        } else {
            low = mid;
        }
        mid = (low + high) / 2;
    }

    mid
}
