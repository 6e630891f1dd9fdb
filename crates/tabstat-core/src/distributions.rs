//! Distribution approximations used by the hypothesis tests
//!
//! These are deliberately simple closed forms, not full-precision
//! implementations: t tail probabilities fall back to a normal
//! approximation with a small-df correction, chi-square tails use the
//! Wilson-Hilferty cube-root transform.

use statrs::function::erf::erfc;
use std::f64::consts::SQRT_2;

/// Standard normal CDF
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / SQRT_2)
}

/// Two-tailed p-value of a t statistic.
///
/// For `df >= 30` this is the exact normal tail. Below that the statistic
/// is first shrunk by `(1 - 1/(4 df)) / sqrt(1 + t^2 / (2 df))`.
pub fn t_two_tailed_p(t: f64, df: f64) -> f64 {
    if !t.is_finite() || df <= 0.0 {
        return 1.0;
    }
    let t = t.abs();
    let z = if df >= 30.0 {
        t
    } else {
        t * (1.0 - 1.0 / (4.0 * df)) / (1.0 + t * t / (2.0 * df)).sqrt()
    };
    (2.0 * (1.0 - normal_cdf(z))).clamp(0.0, 1.0)
}

/// Upper-tail probability of a chi-square statistic (Wilson-Hilferty)
pub fn chi_square_upper_p(chi_square: f64, df: f64) -> f64 {
    if df <= 0.0 || !chi_square.is_finite() {
        return 1.0;
    }
    if chi_square <= 0.0 {
        return 1.0;
    }
    let k = 2.0 / (9.0 * df);
    let z = ((chi_square / df).cbrt() - (1.0 - k)) / k.sqrt();
    (1.0 - normal_cdf(z)).clamp(0.0, 1.0)
}

const BSM_A: [f64; 4] = [
    2.506_628_238_84,
    -18.615_000_625_29,
    41.391_197_735_34,
    -25.441_060_496_37,
];
const BSM_B: [f64; 4] = [
    -8.473_510_930_90,
    23.083_367_437_43,
    -21.062_241_018_26,
    3.130_829_098_33,
];
const BSM_C: [f64; 9] = [
    0.337_475_482_272_614_7,
    0.976_169_019_091_718_6,
    0.160_797_971_491_820_9,
    0.027_643_881_033_386_3,
    0.003_840_572_937_360_9,
    0.000_395_189_651_191_9,
    0.000_032_176_788_176_8,
    0.000_000_288_816_736_4,
    0.000_000_396_031_518_7,
];

/// Inverse standard normal CDF (Beasley-Springer-Moro)
pub fn normal_quantile(p: f64) -> f64 {
    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    let y = p - 0.5;
    if y.abs() < 0.42 {
        let r = y * y;
        let num = ((BSM_A[3] * r + BSM_A[2]) * r + BSM_A[1]) * r + BSM_A[0];
        let den = (((BSM_B[3] * r + BSM_B[2]) * r + BSM_B[1]) * r + BSM_B[0]) * r + 1.0;
        return y * num / den;
    }

    let r = if y < 0.0 { p } else { 1.0 - p };
    let s = (-r.ln()).ln();
    let mut x = BSM_C[8];
    for c in BSM_C[..8].iter().rev() {
        x = x * s + c;
    }
    if y < 0.0 {
        -x
    } else {
        x
    }
}
