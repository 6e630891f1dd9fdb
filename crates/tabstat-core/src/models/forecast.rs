//! Short-horizon linear-trend forecasting

use super::linear::linear_regression;
use crate::types::{ForecastMethod, ForecastResult};

/// Largest horizon `forecast` accepts
pub const MAX_FORECAST_PERIODS: i64 = 20;

/// Extrapolate a linear trend fitted against the index `0..n-1`.
///
/// Forecasts cover `x = n .. n + periods - 1`. The band is
/// `forecast ± 2 * standard_error` and has the same width for every
/// period. `periods` outside `1..=20` or fewer than 3 points give an
/// empty result with method `insufficient_data`.
pub fn forecast(series: &[f64], periods: i64) -> ForecastResult {
    let n = series.len();
    if periods <= 0 || periods > MAX_FORECAST_PERIODS || n < 3 {
        return ForecastResult::insufficient();
    }

    let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let fit = linear_regression(&x, series);
    let margin = 2.0 * fit.standard_error;

    let forecasts: Vec<f64> = (0..periods as usize)
        .map(|h| fit.slope * (n + h) as f64 + fit.intercept)
        .collect();
    let lower_bounds = forecasts.iter().map(|f| f - margin).collect();
    let upper_bounds = forecasts.iter().map(|f| f + margin).collect();

    ForecastResult {
        forecasts,
        lower_bounds,
        upper_bounds,
        method: ForecastMethod::LinearTrend,
        slope: fit.slope,
        intercept: fit.intercept,
        r_squared: fit.r_squared,
        standard_error: fit.standard_error,
    }
}
