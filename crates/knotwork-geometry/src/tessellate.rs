//! Tessellation utilities for converting curves and surfaces to discrete representations.

use knotwork_core::{KnotworkError, Result, Tolerance};
use knotwork_math::Point3;
use log::warn;
use rand::Rng;
use rayon::prelude::*;

use crate::curve::Curve;
use crate::surface::Surface;

/// Settings for adaptive curve sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingOptions {
    /// Maximum distance between the curve and its polyline at a probe point.
    pub tolerance: f64,
    /// Maximum recursion depth for adaptive subdivision.
    pub max_depth: u32,
    /// Seed for the midpoint perturbation.
    pub seed: u64,
}

impl SamplingOptions {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-3,
            max_depth: 12,
            seed: 0,
        }
    }
}

/// Parameter spans shorter than this are never split further.
const MIN_SPAN: f64 = 1e-8;

/// Convert a curve to a polyline using adaptive subdivision.
///
/// Each span is probed at a point drawn from `[0.3, 0.7)` of its parameter
/// range so that symmetric inflections do not hide between probes. The span
/// is bisected when the probe lies farther than `options.tolerance` from the
/// chord, or when the ends meet but the probe does not (a closed loop).
/// Output starts at the domain start and is deterministic for a given `rng`
/// state.
pub fn adaptive_sample<R: Rng>(
    curve: &dyn Curve,
    options: &SamplingOptions,
    rng: &mut R,
) -> Result<Vec<Point3>> {
    if options.tolerance.is_nan() || options.tolerance <= 0.0 {
        return Err(KnotworkError::InvalidInput(format!(
            "sampling tolerance must be positive, got {}",
            options.tolerance
        )));
    }
    let (t_min, t_max) = curve.domain();
    let mut sampler = Sampler {
        curve,
        options,
        rng,
        depth_limited: 0,
    };
    let start = curve.point_at(t_min)?;
    let mut points = vec![start];
    sampler.subdivide(t_min, t_max, start, 0, &mut points)?;

    if sampler.depth_limited > 0 {
        warn!(
            "adaptive sampling hit max depth {} on {} spans",
            options.max_depth, sampler.depth_limited
        );
    }
    Ok(points)
}

struct Sampler<'a, R> {
    curve: &'a dyn Curve,
    options: &'a SamplingOptions,
    rng: &'a mut R,
    depth_limited: usize,
}

impl<R: Rng> Sampler<'_, R> {
    fn subdivide(
        &mut self,
        t0: f64,
        t1: f64,
        p0: Point3,
        depth: u32,
        points: &mut Vec<Point3>,
    ) -> Result<()> {
        let p1 = self.curve.point_at(t1)?;
        let fraction = probe_fraction(&mut *self.rng);
        let probe = self.curve.point_at(t0 + (t1 - t0) * fraction)?;

        let tolerance = self.options.tolerance;
        let looped = p0.distance(p1) < tolerance && p0.distance(probe) > tolerance;
        let needs_split = looped || chord_deviation(p0, probe, p1) > tolerance;

        if !needs_split || t1 - t0 < MIN_SPAN {
            points.push(p1);
            return Ok(());
        }
        if depth >= self.options.max_depth {
            self.depth_limited += 1;
            points.push(p1);
            return Ok(());
        }

        let t_mid = 0.5 * (t0 + t1);
        self.subdivide(t0, t_mid, p0, depth + 1, points)?;
        let p_mid = points[points.len() - 1];
        self.subdivide(t_mid, t1, p_mid, depth + 1, points)
    }
}

/// Relative position of the probe within a span, `0.5 ± 0.2`.
fn probe_fraction<R: Rng>(rng: &mut R) -> f64 {
    0.3 + 0.4 * rng.random::<f64>()
}

/// Distance from `p` to the chord `a`-`b`.
fn chord_deviation(a: Point3, p: Point3, b: Point3) -> f64 {
    let chord = b - a;
    if Tolerance::DEFAULT.is_zero(chord.length()) {
        return p.distance(a);
    }
    let len_sq = chord.length_squared();
    let s = ((p - a).dot(chord) / len_sq).clamp(0.0, 1.0);
    p.distance(a + chord * s)
}

/// Evaluate `count` points at uniformly spaced parameters, ends included.
pub fn regular_sample(curve: &dyn Curve, count: usize) -> Result<Vec<(f64, Point3)>> {
    if count < 2 {
        return Err(KnotworkError::InvalidInput(format!(
            "regular sampling needs at least 2 samples, got {}",
            count
        )));
    }
    let (t_min, t_max) = curve.domain();
    let step = (t_max - t_min) / (count - 1) as f64;
    (0..count)
        .into_par_iter()
        .map(|i| {
            let t = if i == count - 1 { t_max } else { t_min + step * i as f64 };
            curve.point_at(t).map(|p| (t, p))
        })
        .collect()
}

/// Convert a surface to a triangle mesh using uniform parameter subdivision.
///
/// # Arguments
/// * `surface` - The surface to tessellate
/// * `u_divs` - Number of divisions in the u direction
/// * `v_divs` - Number of divisions in the v direction
///
/// # Returns
/// A tuple of `(vertices, triangles)` where each triangle is an array of 3 vertex indices.
pub fn surface_to_triangles(
    surface: &dyn Surface,
    u_divs: usize,
    v_divs: usize,
) -> Result<(Vec<Point3>, Vec<[u32; 3]>)> {
    if u_divs == 0 || v_divs == 0 {
        return Err(KnotworkError::InvalidInput(
            "surface tessellation needs at least one division per direction".into(),
        ));
    }
    let (u_min, u_max) = surface.domain_u();
    let (v_min, v_max) = surface.domain_v();

    let u_count = u_divs + 1;
    let v_count = v_divs + 1;

    // Row-major vertex grid, evaluated in parallel
    let vertices = (0..u_count * v_count)
        .into_par_iter()
        .map(|k| {
            let (i, j) = (k / v_count, k % v_count);
            let u = u_min + (u_max - u_min) * i as f64 / u_divs as f64;
            let v = v_min + (v_max - v_min) * j as f64 / v_divs as f64;
            surface.point_at(u, v)
        })
        .collect::<Result<Vec<_>>>()?;

    // Two triangles per quad
    let idx = |ii: usize, jj: usize| -> u32 { (ii * v_count + jj) as u32 };
    let mut triangles = Vec::with_capacity(u_divs * v_divs * 2);
    for i in 0..u_divs {
        for j in 0..v_divs {
            triangles.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            triangles.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }

    Ok((vertices, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::NurbsCurve;
    use crate::surface::NurbsSurface;
    use knotwork_math::DVec3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::FRAC_PI_2;

    fn s_curve() -> NurbsCurve {
        NurbsCurve::bezier(
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(1.0, 2.0, 0.0),
                DVec3::new(2.0, -2.0, 0.0),
                DVec3::new(3.0, 0.0, 0.0),
            ],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_adaptive_sample_line() {
        let line = NurbsCurve::line(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
        let mut rng = StdRng::seed_from_u64(7);
        let points = adaptive_sample(&line, &SamplingOptions::with_tolerance(0.01), &mut rng).unwrap();
        // A line needs no subdivision
        assert_eq!(points.len(), 2);
        assert!((points[0] - DVec3::ZERO).length() < 1e-10);
        assert!((points[1] - DVec3::new(10.0, 0.0, 0.0)).length() < 1e-10);
    }

    #[test]
    fn test_adaptive_sample_stays_close() {
        let curve = s_curve();
        let options = SamplingOptions::with_tolerance(1e-3);
        let mut rng = StdRng::seed_from_u64(42);
        let points = adaptive_sample(&curve, &options, &mut rng).unwrap();
        assert!(points.len() > 8);
        assert!((points[0] - DVec3::ZERO).length() < 1e-12);
        assert!((points[points.len() - 1] - DVec3::new(3.0, 0.0, 0.0)).length() < 1e-12);

        // Every curve point is near the polyline
        for i in 0..=200 {
            let p = curve.point_at(i as f64 / 200.0).unwrap();
            let nearest = points
                .windows(2)
                .map(|w| chord_deviation(w[0], p, w[1]))
                .fold(f64::INFINITY, f64::min);
            assert!(nearest < 1e-2, "sample {} is {} from the polyline", i, nearest);
        }
    }

    #[test]
    fn test_adaptive_sample_splits_closed_loop() {
        let circle = NurbsCurve::circle(DVec3::ZERO, DVec3::X, DVec3::Y, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let points = adaptive_sample(&circle, &SamplingOptions::with_tolerance(1e-2), &mut rng).unwrap();
        assert!(points.len() > 4);
        for p in &points {
            assert!((p.length() - 1.0).abs() < 1e-10);
        }
    }

    #[test]
    fn test_adaptive_sample_respects_max_depth() {
        let curve = s_curve();
        let options = SamplingOptions {
            tolerance: 1e-9,
            max_depth: 3,
            seed: 0,
        };
        let mut rng = StdRng::seed_from_u64(options.seed);
        let points = adaptive_sample(&curve, &options, &mut rng).unwrap();
        assert!(points.len() <= 9);
    }

    #[test]
    fn test_probe_fraction_is_centered() {
        let mut rng = StdRng::seed_from_u64(3);
        let draws: Vec<f64> = (0..2000).map(|_| probe_fraction(&mut rng)).collect();
        assert!(draws.iter().all(|&f| (0.3..0.7).contains(&f)));
        assert!(draws.iter().any(|&f| f < 0.4));
        assert!(draws.iter().any(|&f| f > 0.6));
        let mean = draws.iter().sum::<f64>() / draws.len() as f64;
        assert!((mean - 0.5).abs() < 0.02);
    }

    #[test]
    fn test_adaptive_sample_rejects_bad_tolerance() {
        let mut rng = StdRng::seed_from_u64(0);
        let options = SamplingOptions::with_tolerance(0.0);
        assert!(adaptive_sample(&s_curve(), &options, &mut rng).is_err());
    }

    #[test]
    fn test_regular_sample() {
        let arc = NurbsCurve::arc(DVec3::ZERO, DVec3::X, DVec3::Y, 1.0, 0.0, FRAC_PI_2).unwrap();
        let samples = regular_sample(&arc, 5).unwrap();
        assert_eq!(samples.len(), 5);
        let params: Vec<f64> = samples.iter().map(|(t, _)| *t).collect();
        assert_eq!(params, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!((samples[4].1 - DVec3::Y).length() < 1e-12);
        assert!(regular_sample(&arc, 1).is_err());
    }

    #[test]
    fn test_surface_to_triangles() {
        let plane = NurbsSurface::new(
            1,
            1,
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 1.0, 1.0],
            vec![
                vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0)],
                vec![DVec3::new(1.0, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0)],
            ],
            None,
        )
        .unwrap();
        let (verts, tris) = surface_to_triangles(&plane, 4, 3).unwrap();
        assert_eq!(verts.len(), 5 * 4);
        assert_eq!(tris.len(), 4 * 3 * 2);
        assert!((verts[4 * 3 + 1] - DVec3::new(0.75, 1.0 / 3.0, 0.0)).length() < 1e-12);

        // All indices in range
        for tri in &tris {
            for &idx in tri {
                assert!((idx as usize) < verts.len());
            }
        }

        assert!(surface_to_triangles(&plane, 0, 3).is_err());
    }
}
