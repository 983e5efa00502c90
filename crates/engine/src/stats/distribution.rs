//! Distribution functions behind the significance tests and intervals.

use std::f64::consts::SQRT_2;

/// Complementary error function (Numerical Recipes `erfcc`, fractional error < 1.2e-7)
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);
    let poly = -1.26551223
        + t * (1.00002368
            + t * (0.37409196
                + t * (0.09678418
                    + t * (-0.18628806
                        + t * (0.27886807
                            + t * (-1.13520398
                                + t * (1.48851587 + t * (-0.82215223 + t * 0.17087277))))))));
    let ans = t * (-z * z + poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Standard normal CDF: Φ(z) = 1 - erfc(z / sqrt(2)) / 2
pub fn normal_cdf(z: f64) -> f64 {
    1.0 - 0.5 * erfc(z / SQRT_2)
}

// Acklam's rational approximation, relative error < 1.15e-9
const A: [f64; 6] = [
    -3.969683028665376e+01,
    2.209460984245205e+02,
    -2.759285104469687e+02,
    1.383577518672690e+02,
    -3.066479806614716e+01,
    2.506628277459239e+00,
];
const B: [f64; 5] = [
    -5.447609879822406e+01,
    1.615858368580409e+02,
    -1.556989798598866e+02,
    6.680131188771972e+01,
    -1.328068155288572e+01,
];
const C: [f64; 6] = [
    -7.784894002430293e-03,
    -3.223964580411365e-01,
    -2.400758277161838e+00,
    -2.549732539343734e+00,
    4.374664141464968e+00,
    2.938163982698783e+00,
];
const D: [f64; 4] = [
    7.784695709041462e-03,
    3.224671290700398e-01,
    2.445134137142996e+00,
    3.754408661907416e+00,
];
const P_LOW: f64 = 0.02425;

/// Inverse of the standard normal CDF. NaN outside (0, 1).
pub fn normal_quantile(p: f64) -> f64 {
    if !(p > 0.0 && p < 1.0) {
        return f64::NAN;
    }

    let tail = |q: f64| {
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    };

    if p < P_LOW {
        tail((-2.0 * p.ln()).sqrt())
    } else if p > 1.0 - P_LOW {
        -tail((-2.0 * (1.0 - p).ln()).sqrt())
    } else {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    }
}

/// Critical value for a two-sided interval at `confidence` (e.g. 0.95).
pub fn z_critical(confidence: f64) -> f64 {
    normal_quantile(1.0 - (1.0 - confidence) / 2.0)
}

/// Upper-tail p-value of a chi-square statistic with one degree of freedom.
pub fn chi_square_p_value(chi: f64) -> f64 {
    if chi <= 0.0 {
        return 1.0;
    }
    erfc((chi / 2.0).sqrt()).clamp(0.0, 1.0)
}

fn ln_factorials(n: usize) -> Vec<f64> {
    let mut table = Vec::with_capacity(n + 1);
    table.push(0.0);
    let mut acc = 0.0;
    for k in 1..=n {
        acc += (k as f64).ln();
        table.push(acc);
    }
    table
}

/// Two-sided Fisher's exact test for the 2x2 table `[[a, b], [c, d]]`.
///
/// Sums the hypergeometric probabilities of every table with the same
/// margins that is no more likely than the observed one.
pub fn fisher_exact_two_sided(a: u64, b: u64, c: u64, d: u64) -> f64 {
    let (r1, r2) = (a + b, c + d);
    let c1 = a + c;
    let n = r1 + r2;
    if n == 0 {
        return 1.0;
    }

    let lf = ln_factorials(n as usize);
    let f = |k: u64| lf[k as usize];
    let fixed = f(r1) + f(r2) + f(c1) + f(n - c1) - f(n);
    let prob = |x: u64| (fixed - f(x) - f(r1 - x) - f(c1 - x) - f(r2 + x - c1)).exp();

    let p_observed = prob(a);
    let lo = c1.saturating_sub(r2);
    let hi = r1.min(c1);

    // Relative tolerance so ties with the observed table are counted
    let threshold = p_observed * (1.0 + 1e-7);
    let p: f64 = (lo..=hi).map(prob).filter(|&p| p <= threshold).sum();
    p.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erfc_reference_points() {
        assert!((erfc(0.0) - 1.0).abs() < 1e-7);
        assert!((erfc(1.0) - 0.157_299_207).abs() < 1e-7);
        assert!((erfc(-1.0) - 1.842_700_793).abs() < 1e-7);
        assert!(erfc(6.0) < 1e-15);
    }

    #[test]
    fn test_normal_quantile() {
        assert!((z_critical(0.95) - 1.959_963_985).abs() < 1e-8);
        assert!(normal_quantile(0.5).abs() < 1e-12);
        assert!((normal_quantile(0.01) + 2.326_347_874).abs() < 1e-8);
        assert!((normal_quantile(0.999) - 3.090_232_306).abs() < 1e-8);
        assert!(normal_quantile(0.0).is_nan());
        assert!(normal_quantile(1.0).is_nan());
    }

    #[test]
    fn test_normal_cdf_inverts_quantile() {
        for p in [0.01, 0.1, 0.5, 0.9, 0.975] {
            assert!((normal_cdf(normal_quantile(p)) - p).abs() < 1e-6);
        }
    }

    #[test]
    fn test_chi_square_p_value() {
        // 3.841 is the 5% critical value for 1 df
        assert!((chi_square_p_value(3.841_459) - 0.05).abs() < 1e-5);
        assert_eq!(chi_square_p_value(0.0), 1.0);
    }

    #[test]
    fn test_fisher_known_values() {
        // Tea tasting: [[3, 1], [1, 3]] two-sided p = 0.4857
        assert!((fisher_exact_two_sided(3, 1, 1, 3) - 0.485_714).abs() < 1e-5);
        // [[1, 9], [11, 3]] two-sided p = 0.002759
        assert!((fisher_exact_two_sided(1, 9, 11, 3) - 0.002_759).abs() < 1e-5);
        assert_eq!(fisher_exact_two_sided(0, 0, 0, 0), 1.0);
    }

    #[test]
    fn test_fisher_symmetric_table_is_one() {
        assert!((fisher_exact_two_sided(2, 2, 2, 2) - 1.0).abs() < 1e-9);
    }
}
