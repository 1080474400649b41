//! B-spline basis functions and their derivatives (Cox–de Boor).

/// Compute the non-vanishing basis functions at parameter `t`.
///
/// Returns a vector of `degree + 1` basis function values N_{span-degree,degree}(t)
/// through N_{span,degree}(t).
///
/// # Arguments
/// * `degree` - Degree of the B-spline
/// * `knots` - The knot vector
/// * `span` - The knot span index (from `find_span`)
/// * `t` - Parameter value
pub fn basis_functions(degree: usize, knots: &[f64], span: usize, t: f64) -> Vec<f64> {
    let mut n = vec![0.0; degree + 1];
    let mut left = vec![0.0; degree + 1];
    let mut right = vec![0.0; degree + 1];

    n[0] = 1.0;

    for j in 1..=degree {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            let temp = n[r] / (right[r + 1] + left[j - r]);
            n[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }

        n[j] = saved;
    }

    n
}

/// Compute the basis functions and their derivatives up to `num_derivs` at `t`.
///
/// `ders[k][j]` is the k-th derivative of N_{span-degree+j,degree}(t). The
/// result always has `num_derivs + 1` rows; rows above `degree` are zero since
/// a degree-p polynomial has no non-zero derivatives past order p.
pub fn derivative_basis_functions(
    degree: usize,
    knots: &[f64],
    span: usize,
    t: f64,
    num_derivs: usize,
) -> Vec<Vec<f64>> {
    let p = degree;
    let n = num_derivs.min(p);

    // ndu: basis functions in the upper triangle, knot differences in the lower
    let mut ndu = vec![vec![0.0; p + 1]; p + 1];
    let mut left = vec![0.0; p + 1];
    let mut right = vec![0.0; p + 1];

    ndu[0][0] = 1.0;

    for j in 1..=p {
        left[j] = t - knots[span + 1 - j];
        right[j] = knots[span + j] - t;
        let mut saved = 0.0;

        for r in 0..j {
            ndu[j][r] = right[r + 1] + left[j - r];
            let temp = ndu[r][j - 1] / ndu[j][r];

            ndu[r][j] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        ndu[j][j] = saved;
    }

    let mut ders = vec![vec![0.0; p + 1]; num_derivs + 1];
    for j in 0..=p {
        ders[0][j] = ndu[j][p];
    }

    // Two alternating rows of coefficients a_{k,j}
    let mut a = vec![vec![0.0; p + 1]; 2];

    for r in 0..=p {
        let mut s1 = 0usize;
        let mut s2 = 1usize;
        a[0][0] = 1.0;

        for k in 1..=n {
            let mut d = 0.0;
            let rk = r as isize - k as isize;
            let pk = p - k;

            if rk >= 0 {
                let rk = rk as usize;
                a[s2][0] = a[s1][0] / ndu[pk + 1][rk];
                d = a[s2][0] * ndu[rk][pk];
            }

            let j1 = if rk >= -1 { 1 } else { (-rk) as usize };
            let j2 = if r <= pk + 1 { k - 1 } else { p - r };

            for j in j1..=j2 {
                let idx = (rk + j as isize) as usize;
                a[s2][j] = (a[s1][j] - a[s1][j - 1]) / ndu[pk + 1][idx];
                d += a[s2][j] * ndu[idx][pk];
            }

            if r <= pk {
                a[s2][k] = -a[s1][k - 1] / ndu[pk + 1][r];
                d += a[s2][k] * ndu[r][pk];
            }

            ders[k][r] = d;
            std::mem::swap(&mut s1, &mut s2);
        }
    }

    // Multiply through by the falling factorial p * (p-1) * ... * (p-k+1)
    let mut factor = p as f64;
    for k in 1..=n {
        for val in &mut ders[k] {
            *val *= factor;
        }
        factor *= (p - k) as f64;
    }

    ders
}

/// Binomial coefficient `C(n, k)` as a float.
pub fn binomial(n: usize, k: usize) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * (n - i) as f64 / (i + 1) as f64)
}
