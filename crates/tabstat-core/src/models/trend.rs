//! Trend classification over an ordered series

use super::linear::{linear_regression, multiple_linear_regression};
use crate::types::{TrendResult, TrendStrength, TrendType};

/// Slopes smaller than this (per period) count as flat
const FLAT_SLOPE: f64 = 0.01;
/// Linear fits explaining less than this count as no trend
const MIN_R_SQUARED: f64 = 0.1;
/// Quadratic must beat the linear R-squared by more than this
const QUADRATIC_GAIN: f64 = 0.1;

/// Classify the trend of `series` against the index `0..n-1`.
///
/// A weak linear fit (R-squared below 0.5) on five or more points is
/// compared with a quadratic fit on `[x, x^2]`; the quadratic wins when it
/// improves R-squared by more than 0.1.
pub fn trend_analysis(series: &[f64]) -> TrendResult {
    let n = series.len();
    if n < 3 {
        return TrendResult {
            trend_type: TrendType::NoTrend,
            strength: TrendStrength::Weak,
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            description: "Insufficient data for trend analysis (need at least 3 points)".into(),
            n,
        };
    }

    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let fit = linear_regression(&x, series);

    let mut trend_type = if fit.slope.abs() < FLAT_SLOPE || fit.r_squared < MIN_R_SQUARED {
        TrendType::NoTrend
    } else if fit.slope > 0.0 {
        TrendType::Increasing
    } else {
        TrendType::Decreasing
    };
    let mut r_squared = fit.r_squared;

    if fit.r_squared < 0.5 && n >= 5 {
        let x2: Vec<f64> = x.iter().map(|v| v * v).collect();
        let quad = multiple_linear_regression(&[x.clone(), x2], series);
        if !quad.coefficients.is_empty() && quad.r_squared > fit.r_squared + QUADRATIC_GAIN {
            trend_type = TrendType::Quadratic;
            r_squared = quad.r_squared;
        }
    }

    let strength = if r_squared >= 0.7 {
        TrendStrength::Strong
    } else if r_squared >= 0.3 {
        TrendStrength::Moderate
    } else {
        TrendStrength::Weak
    };

    let description = match trend_type {
        TrendType::NoTrend => format!(
            "No significant trend (slope {:.4} per period, R² {:.3})",
            fit.slope, r_squared
        ),
        TrendType::Quadratic => format!(
            "{} curved (quadratic) pattern (R² {:.3}, linear R² {:.3})",
            capitalize(strength.as_str()),
            r_squared,
            fit.r_squared
        ),
        _ => format!(
            "{} {} trend (slope {:.4} per period, R² {:.3})",
            capitalize(strength.as_str()),
            trend_type.as_str(),
            fit.slope,
            r_squared
        ),
    };

    TrendResult {
        trend_type,
        strength,
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared,
        description,
        n,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increasing() {
        let series: Vec<f64> = [1.0, 2.0, 3.0, 4.0, 5.0].iter().map(|v| v * 3.0).collect();
        let result = trend_analysis(&series);
        assert_eq!(result.trend_type, TrendType::Increasing);
        assert_eq!(result.strength, TrendStrength::Strong);
        assert!(result.description.starts_with("Strong increasing"));
    }

    #[test]
    fn test_decreasing() {
        let result = trend_analysis(&[10.0, 8.1, 6.0, 3.9, 2.0, 0.1]);
        assert_eq!(result.trend_type, TrendType::Decreasing);
        assert_eq!(result.strength, TrendStrength::Strong);
    }

    #[test]
    fn test_flat() {
        let result = trend_analysis(&[5.0, 5.0, 5.0, 5.0, 5.0]);
        assert_eq!(result.trend_type, TrendType::NoTrend);
    }

    #[test]
    fn test_quadratic() {
        // symmetric parabola: linear slope ~0, quadratic fits exactly
        let series: Vec<f64> = (0..9).map(|i| ((i as f64) - 4.0).powi(2)).collect();
        let result = trend_analysis(&series);
        assert_eq!(result.trend_type, TrendType::Quadratic);
        assert_eq!(result.strength, TrendStrength::Strong);
    }

    #[test]
    fn test_insufficient() {
        let result = trend_analysis(&[1.0, 2.0]);
        assert_eq!(result.trend_type, TrendType::NoTrend);
        assert_eq!(result.strength, TrendStrength::Weak);
        assert!(result.description.contains("Insufficient data"));
    }
}
