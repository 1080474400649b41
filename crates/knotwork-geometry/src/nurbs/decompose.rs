//! Decomposition of a curve into Bezier segments.

use std::iter::repeat;

use knotwork_core::Result;
use knotwork_math::HPoint;
use log::debug;

use super::insert::refine_knots;
use super::knot::KnotVector;
use super::split::Piece;

/// Split a curve into Bezier segments by raising every interior knot to
/// multiplicity `degree + 1`.
///
/// Each segment has `degree + 1` control points and `2 * (degree + 1)` knots
/// and keeps the global parametrization, so segment `i` evaluated at `u`
/// matches the curve at `u` on that segment's domain.
pub fn decompose_into_beziers(
    degree: usize,
    knots: &KnotVector,
    control_points: &[HPoint],
) -> Result<Vec<Piece>> {
    let order = degree + 1;
    let to_insert: Vec<f64> = knots
        .interior_distinct()
        .into_iter()
        .flat_map(|(value, mult)| repeat(value).take(order.saturating_sub(mult)))
        .collect();
    let (refined_knots, refined_points) = refine_knots(degree, knots, control_points, &to_insert)?;

    let kn = refined_knots.as_slice();
    let segments = kn.len() / order - 1;
    let pieces: Vec<Piece> = (0..segments)
        .map(|i| {
            let start = i * order;
            (
                KnotVector::new(kn[start..start + 2 * order].to_vec()),
                refined_points[start..start + order].to_vec(),
            )
        })
        .collect();

    debug!(
        "decomposed degree {} curve into {} bezier segments",
        degree,
        pieces.len()
    );
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nurbs::eval::curve_point;
    use knotwork_math::homogeneous::to_homogeneous;
    use knotwork_math::DVec3;

    #[test]
    fn test_decompose_segment_layout() {
        let knots = KnotVector::new(vec![0.0, 0.0, 0.0, 0.0, 0.3, 0.6, 0.6, 1.0, 1.0, 1.0, 1.0]);
        let cps: Vec<HPoint> = (0..7)
            .map(|i| to_homogeneous(DVec3::new(i as f64, (i % 3) as f64, 0.0), 1.0 + 0.2 * (i % 2) as f64))
            .collect();
        let segments = decompose_into_beziers(3, &knots, &cps).unwrap();
        assert_eq!(segments.len(), 3);

        let domains: Vec<(f64, f64)> = segments.iter().map(|(k, _)| k.domain(3)).collect();
        assert_eq!(domains, vec![(0.0, 0.3), (0.3, 0.6), (0.6, 1.0)]);

        for (seg_knots, seg_points) in &segments {
            assert_eq!(seg_points.len(), 4);
            assert_eq!(seg_knots.len(), 8);
            assert_eq!(seg_knots.distinct().len(), 2);
        }

        for (seg_knots, seg_points) in &segments {
            let (a, b) = seg_knots.domain(3);
            for i in 0..=10 {
                let u = a + (b - a) * i as f64 / 10.0;
                let expected = curve_point(3, &knots, &cps, u).unwrap();
                let actual = curve_point(3, seg_knots, seg_points, u).unwrap();
                assert!((expected - actual).length() < 1e-10);
            }
        }

        // Consecutive segments meet at a shared end point
        for pair in segments.windows(2) {
            assert!((pair[0].1[3] - pair[1].1[0]).length() < 1e-12);
        }
    }

    #[test]
    fn test_decompose_bezier_is_identity() {
        let knots = KnotVector::new(vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let cps: Vec<HPoint> = [DVec3::ZERO, DVec3::X, DVec3::Y]
            .iter()
            .map(|&p| to_homogeneous(p, 1.0))
            .collect();
        let segments = decompose_into_beziers(2, &knots, &cps).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].0, knots);
        assert_eq!(segments[0].1, cps);
    }
}
