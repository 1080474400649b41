//! Arc length over the Bezier decomposition of a curve.
//!
//! Each segment is integrated with Gauss-Legendre quadrature of `|C'(t)|`.
//! Segments are smooth polynomials in homogeneous space, so a fixed rule of
//! order `16 + degree` is accurate without adaptive refinement.

use std::cell::Cell;

use gauss_quad::GaussLegendre;
use knotwork_core::{KnotworkError, Result, Tolerance};
use log::trace;
use rayon::prelude::*;

use crate::curve::NurbsCurve;
use crate::nurbs::knot::KNOT_EPS;

/// Bisection stops after this many halvings even if `tolerance` is zero.
const MAX_BISECTIONS: usize = 200;

/// Per-segment and cumulative arc lengths of one curve.
#[derive(Debug, Clone)]
pub struct ArcLengthTable {
    domain: (f64, f64),
    segments: Vec<NurbsCurve>,
    lengths: Vec<f64>,
    cumulative: Vec<f64>,
    quadrature_order: usize,
}

impl ArcLengthTable {
    pub fn new(curve: &NurbsCurve) -> Result<Self> {
        let segments = curve.decompose_into_beziers()?;
        let quadrature_order = 16 + curve.degree();
        let gauss = GaussLegendre::init(quadrature_order);

        let lengths = segments
            .par_iter()
            .map(|segment| {
                let (a, b) = segment.domain();
                integrate_speed(&gauss, segment, a, b)
            })
            .collect::<Result<Vec<f64>>>()?;

        let mut cumulative = Vec::with_capacity(lengths.len());
        let mut total = 0.0;
        for (i, &len) in lengths.iter().enumerate() {
            total += len;
            trace!("segment {} length {} (cumulative {})", i, len, total);
            cumulative.push(total);
        }

        Ok(Self {
            domain: curve.domain(),
            segments,
            lengths,
            cumulative,
            quadrature_order,
        })
    }

    pub fn total_length(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Lengths of the Bezier segments in parameter order.
    pub fn segment_lengths(&self) -> &[f64] {
        &self.lengths
    }

    /// Arc length from the start of the domain to `u`.
    pub fn length_at(&self, u: f64) -> Result<f64> {
        let (min, max) = self.domain;
        if u.is_nan() || u < min - KNOT_EPS || u > max + KNOT_EPS {
            return Err(KnotworkError::OutOfDomain { value: u, min, max });
        }
        let u = u.clamp(min, max);
        let gauss = GaussLegendre::init(self.quadrature_order);

        let mut total = 0.0;
        for (segment, &len) in self.segments.iter().zip(&self.lengths) {
            let (a, b) = segment.domain();
            if u >= b {
                total += len;
            } else {
                if u > a {
                    total += integrate_speed(&gauss, segment, a, u)?;
                }
                break;
            }
        }
        Ok(total)
    }

    /// Parameter where the arc length from the start reaches `length`,
    /// found by bisection within the containing segment until the length
    /// error is at most `tolerance`.
    ///
    /// Lengths outside `(0, total)` map to the domain ends.
    pub fn param_at_length(&self, length: f64, tolerance: f64) -> Result<f64> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(KnotworkError::InvalidInput(format!(
                "tolerance must be non-negative, got {}",
                tolerance
            )));
        }
        let (min, max) = self.domain;
        if length <= 0.0 {
            return Ok(min);
        }
        if length >= self.total_length() {
            return Ok(max);
        }

        let index = self
            .cumulative
            .iter()
            .position(|&c| c >= length)
            .unwrap_or(self.segments.len() - 1);
        let segment = &self.segments[index];
        let target = length - (self.cumulative[index] - self.lengths[index]);
        let gauss = GaussLegendre::init(self.quadrature_order);

        let (a, b) = segment.domain();
        let (mut lo, mut hi) = (a, b);
        let mut mid = 0.5 * (lo + hi);
        for _ in 0..MAX_BISECTIONS {
            mid = 0.5 * (lo + hi);
            let len = integrate_speed(&gauss, segment, a, mid)?;
            if (len - target).abs() <= tolerance || hi - lo <= KNOT_EPS {
                break;
            }
            if len < target {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        Ok(mid)
    }

    /// Parameters of `count + 1` stations equally spaced by arc length,
    /// including both ends of the domain.
    pub fn divide_by_length(&self, count: usize) -> Result<Vec<f64>> {
        if count == 0 {
            return Err(KnotworkError::InvalidInput(
                "cannot divide a curve into zero parts".into(),
            ));
        }
        let total = self.total_length();
        (0..=count)
            .map(|i| {
                self.param_at_length(total * i as f64 / count as f64, Tolerance::DEFAULT.linear)
            })
            .collect()
    }
}

/// Integral of the curve speed over `[a, b]`.
fn integrate_speed(gauss: &GaussLegendre, segment: &NurbsCurve, a: f64, b: f64) -> Result<f64> {
    let failure = Cell::new(None);
    let length = gauss.integrate(a, b, |t| match segment.derivatives(t, 1) {
        Ok(ders) => ders[1].length(),
        Err(err) => {
            failure.set(Some(err));
            0.0
        }
    });
    match failure.into_inner() {
        Some(err) => Err(err),
        None => Ok(length),
    }
}
