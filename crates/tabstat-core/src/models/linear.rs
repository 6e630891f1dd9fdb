//! Least-squares regression
//!
//! Simple regression uses the closed-form slope/intercept. Multiple
//! regression solves the normal equations `(X'X) b = X'y` by Gaussian
//! elimination with partial pivoting.

use crate::descriptive::mean;
use crate::types::{LinearRegressionResult, MultipleRegressionResult};
use faer::Mat;

/// Pivots smaller than this are treated as a singular system
const PIVOT_EPS: f64 = 1e-12;

/// Ordinary least squares with one predictor
///
/// Mismatched lengths, fewer than 2 points or an x with no variance give
/// an all-zero result with empty predictions/residuals.
pub fn linear_regression(x: &[f64], y: &[f64]) -> LinearRegressionResult {
    let n = x.len();
    if n != y.len() || n < 2 {
        return LinearRegressionResult::default();
    }

    let mx = mean(x);
    let my = mean(y);
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
    }
    if sxx == 0.0 {
        return LinearRegressionResult::default();
    }

    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    let predictions: Vec<f64> = x.iter().map(|a| slope * a + intercept).collect();
    let residuals: Vec<f64> = y.iter().zip(&predictions).map(|(b, p)| b - p).collect();

    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let sst: f64 = y.iter().map(|b| (b - my).powi(2)).sum();

    LinearRegressionResult {
        slope,
        intercept,
        r_squared: r_squared(sse, sst),
        predictions,
        residuals,
        standard_error: if n > 2 {
            (sse / (n - 2) as f64).sqrt()
        } else {
            0.0
        },
    }
}

/// Multiple linear regression with an intercept
///
/// `x` holds one vector per predictor, each as long as `y`. Requires
/// `n >= predictors + 2`; otherwise (or for mismatched lengths or a
/// singular system) coefficients are empty and R-squared is 0.
pub fn multiple_linear_regression(x: &[Vec<f64>], y: &[f64]) -> MultipleRegressionResult {
    let n = y.len();
    let k = x.len();
    if k == 0 || n < k + 2 || x.iter().any(|col| col.len() != n) {
        return MultipleRegressionResult::default();
    }

    let p = k + 1;
    let design = |i: usize, j: usize| if j == 0 { 1.0 } else { x[j - 1][i] };

    let mut xtx = Mat::<f64>::from_fn(p, p, |a, b| {
        (0..n).map(|i| design(i, a) * design(i, b)).sum()
    });
    let mut xty: Vec<f64> = (0..p)
        .map(|a| (0..n).map(|i| design(i, a) * y[i]).sum())
        .collect();

    let coefficients = match solve_gaussian(&mut xtx, &mut xty) {
        Some(beta) => beta,
        None => return MultipleRegressionResult::default(),
    };

    let predictions: Vec<f64> = (0..n)
        .map(|i| (0..p).map(|j| design(i, j) * coefficients[j]).sum())
        .collect();
    let residuals: Vec<f64> = y.iter().zip(&predictions).map(|(b, f)| b - f).collect();

    let my = mean(y);
    let sse: f64 = residuals.iter().map(|r| r * r).sum();
    let sst: f64 = y.iter().map(|b| (b - my).powi(2)).sum();
    let r2 = r_squared(sse, sst);
    let dof = (n - p) as f64;

    MultipleRegressionResult {
        coefficients,
        r_squared: r2,
        adj_r_squared: 1.0 - (1.0 - r2) * (n - 1) as f64 / dof,
        predictions,
        residuals,
        standard_error: (sse / dof).sqrt(),
        n_observations: n,
    }
}

fn r_squared(sse: f64, sst: f64) -> f64 {
    if sst == 0.0 {
        0.0
    } else {
        1.0 - sse / sst
    }
}

/// Solve `a * b = rhs` in place by Gaussian elimination with partial pivoting.
///
/// Returns `None` when a pivot falls below `PIVOT_EPS`.
#[allow(clippy::needless_range_loop)]
fn solve_gaussian(a: &mut Mat<f64>, rhs: &mut [f64]) -> Option<Vec<f64>> {
    let n = rhs.len();

    for col in 0..n {
        // swap in the row with the largest absolute pivot
        let mut pivot_row = col;
        for r in col + 1..n {
            if a[(r, col)].abs() > a[(pivot_row, col)].abs() {
                pivot_row = r;
            }
        }
        if a[(pivot_row, col)].abs() < PIVOT_EPS {
            return None;
        }
        if pivot_row != col {
            for c in 0..n {
                let tmp = a[(col, c)];
                a[(col, c)] = a[(pivot_row, c)];
                a[(pivot_row, c)] = tmp;
            }
            rhs.swap(col, pivot_row);
        }

        for r in col + 1..n {
            let factor = a[(r, col)] / a[(col, col)];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                let v = a[(col, c)];
                a[(r, c)] -= factor * v;
            }
            rhs[r] -= factor * rhs[col];
        }
    }

    // back-substitution
    let mut beta = vec![0.0; n];
    for r in (0..n).rev() {
        let mut acc = rhs[r];
        for c in r + 1..n {
            acc -= a[(r, c)] * beta[c];
        }
        beta[r] = acc / a[(r, r)];
    }
    Some(beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_simple_linear() {
        // y = 2x + 1
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let y = vec![3.0, 5.0, 7.0, 9.0, 11.0];
        let fit = linear_regression(&x, &y);

        assert_abs_diff_eq!(fit.slope, 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.intercept, 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(fit.standard_error, 0.0, epsilon = 1e-10);
        assert_eq!(fit.predictions.len(), 5);
    }

    #[test]
    fn test_simple_noisy() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        let y = vec![2.1, 4.0, 5.9, 8.1, 10.0, 11.9, 14.1, 16.0, 17.9, 20.1];
        let fit = linear_regression(&x, &y);

        assert!((fit.slope - 2.0).abs() < 0.05);
        assert!(fit.r_squared > 0.99);
        assert!(fit.standard_error > 0.0);
        let resid_sum: f64 = fit.residuals.iter().sum();
        assert_abs_diff_eq!(resid_sum, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_simple_mismatched_lengths() {
        let fit = linear_regression(&[1.0, 2.0, 3.0], &[1.0, 2.0]);
        assert_eq!(fit, LinearRegressionResult::default());
        assert!(fit.predictions.is_empty());
    }

    #[test]
    fn test_simple_zero_variance_x() {
        let fit = linear_regression(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(fit.slope, 0.0);
        assert!(fit.residuals.is_empty());
    }

    #[test]
    fn test_multiple_exact() {
        // y = 1 + 2 a - 3 b
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = vec![2.0, 1.0, 4.0, 3.0, 6.0, 5.0];
        let y: Vec<f64> = a.iter().zip(&b).map(|(a, b)| 1.0 + 2.0 * a - 3.0 * b).collect();
        let fit = multiple_linear_regression(&[a, b], &y);

        assert_eq!(fit.coefficients.len(), 3);
        assert_abs_diff_eq!(fit.coefficients[0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[1], 2.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.coefficients[2], -3.0, epsilon = 1e-8);
        assert_abs_diff_eq!(fit.r_squared, 1.0, epsilon = 1e-8);
    }

    #[test]
    fn test_multiple_matches_simple() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![1.5, 2.9, 4.2, 4.8, 6.1, 7.4];
        let simple = linear_regression(&x, &y);
        let multi = multiple_linear_regression(&[x], &y);

        assert_abs_diff_eq!(multi.coefficients[0], simple.intercept, epsilon = 1e-9);
        assert_abs_diff_eq!(multi.coefficients[1], simple.slope, epsilon = 1e-9);
        assert_abs_diff_eq!(multi.r_squared, simple.r_squared, epsilon = 1e-9);
    }

    #[test]
    fn test_multiple_insufficient() {
        // two predictors need at least four observations
        let fit = multiple_linear_regression(&[vec![1.0, 2.0, 3.0], vec![3.0, 1.0, 2.0]], &[1.0, 2.0, 3.0]);
        assert!(fit.coefficients.is_empty());
        assert_eq!(fit.r_squared, 0.0);
    }

    #[test]
    fn test_multiple_singular() {
        // b = 2a, perfectly collinear
        let a = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let b: Vec<f64> = a.iter().map(|v| 2.0 * v).collect();
        let y = vec![1.0, 3.0, 2.0, 5.0, 4.0];
        let fit = multiple_linear_regression(&[a, b], &y);
        assert!(fit.coefficients.is_empty());
    }
}
