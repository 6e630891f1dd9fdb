//! Statistical hypothesis testing
//!
//! Insufficient input never raises: each test returns a documented
//! sentinel result (statistic 0, p-value 1) so callers can render
//! "insufficient data" instead of failing.

pub mod categorical;

pub use categorical::{chi_square_test, contingency_table};
pub use correlation::{
    correlation_matrix, covariance, covariance_matrix, pearson_correlation, pearson_test,
};
pub use distributional::normality_test;
pub use parametric::{one_sample_t_test, two_sample_t_test};

use serde::Serialize;

/// Result of a t-test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    /// t statistic
    pub statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub df: f64,
    /// Group 1 sample size (the only group for one-sample tests)
    pub n1: usize,
    /// Group 2 sample size (0 for one-sample tests)
    pub n2: usize,
    /// Test method/name
    pub method: String,
}

impl TestResult {
    pub(crate) fn degenerate(n1: usize, n2: usize, method: &str) -> Self {
        Self {
            statistic: 0.0,
            p_value: 1.0,
            df: 0.0,
            n1,
            n2,
            method: method.into(),
        }
    }
}

/// Chi-square test result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquareResult {
    /// Chi-square statistic
    pub statistic: f64,
    /// p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub df: usize,
    /// Total count in the table
    pub n: f64,
    /// Method name
    pub method: String,
}

/// Normality test result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalityResult {
    /// W statistic
    pub statistic: f64,
    /// p-value
    pub p_value: f64,
    /// Whether normality is not rejected at the configured alpha
    pub is_normal: bool,
    /// Sample size
    pub n: usize,
    /// Method name
    pub method: String,
}

/// Pearson correlation with its sample size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationResult {
    /// Correlation coefficient
    pub r: f64,
    /// t statistic for H0: r = 0
    pub statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Number of complete pairs
    pub n: usize,
    /// Method name
    pub method: String,
}
