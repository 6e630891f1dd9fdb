use serde::Serialize;

// ============================================================================
// Regression
// ============================================================================

/// Simple (one predictor) least-squares fit
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LinearRegressionResult {
    /// Slope (0 for degenerate input, never infinite)
    pub slope: f64,
    /// Intercept
    pub intercept: f64,
    /// R-squared (coefficient of determination)
    pub r_squared: f64,
    /// Fitted values, one per observation
    pub predictions: Vec<f64>,
    /// Residuals y - y_hat
    pub residuals: Vec<f64>,
    /// Residual standard error, sqrt(SSE / (n - 2))
    pub standard_error: f64,
}

/// Multiple least-squares fit via the normal equations
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MultipleRegressionResult {
    /// Coefficients, intercept first then one per predictor.
    /// Empty when the fit is not possible.
    pub coefficients: Vec<f64>,
    /// R-squared
    pub r_squared: f64,
    /// Adjusted R-squared
    pub adj_r_squared: f64,
    /// Fitted values
    pub predictions: Vec<f64>,
    /// Residuals
    pub residuals: Vec<f64>,
    /// Residual standard error, sqrt(SSE / (n - p - 1))
    pub standard_error: f64,
    /// Number of observations used
    pub n_observations: usize,
}

// ============================================================================
// Trend and forecast
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendType {
    Increasing,
    Decreasing,
    NoTrend,
    Quadratic,
}

impl TrendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendType::Increasing => "increasing",
            TrendType::Decreasing => "decreasing",
            TrendType::NoTrend => "no_trend",
            TrendType::Quadratic => "quadratic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendStrength {
    Strong,
    Moderate,
    Weak,
}

impl TrendStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendStrength::Strong => "strong",
            TrendStrength::Moderate => "moderate",
            TrendStrength::Weak => "weak",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub trend_type: TrendType,
    pub strength: TrendStrength,
    /// Linear slope per period
    pub slope: f64,
    pub intercept: f64,
    /// R-squared of the reported model (quadratic when `trend_type` is quadratic)
    pub r_squared: f64,
    pub description: String,
    pub n: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    LinearTrend,
    InsufficientData,
}

impl ForecastMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastMethod::LinearTrend => "linear_trend",
            ForecastMethod::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Point forecasts for periods n, n+1, ...
    pub forecasts: Vec<f64>,
    /// forecast - 2 * standard error
    pub lower_bounds: Vec<f64>,
    /// forecast + 2 * standard error
    pub upper_bounds: Vec<f64>,
    pub method: ForecastMethod,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub standard_error: f64,
}

impl ForecastResult {
    pub(crate) fn insufficient() -> Self {
        Self {
            forecasts: Vec::new(),
            lower_bounds: Vec::new(),
            upper_bounds: Vec::new(),
            method: ForecastMethod::InsufficientData,
            slope: 0.0,
            intercept: 0.0,
            r_squared: 0.0,
            standard_error: 0.0,
        }
    }
}

// ============================================================================
// Engine configuration
// ============================================================================

/// What to do with an expression that matches no known shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnmatchedPolicy {
    /// Return the table unchanged (documented fallback)
    #[default]
    ReturnTable,
    /// Fail with `UnsupportedOperation`
    Reject,
}

/// Options for the expression engine
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Row count for `head()`/`tail()` without an argument
    pub default_head: usize,
    /// Largest accepted `head(n)`/`tail(n)`
    pub max_head: usize,
    /// Largest accepted forecast horizon
    pub max_forecast_periods: usize,
    /// Significance level for `is_normal`
    pub normality_alpha: f64,
    /// Behaviour for unmatched expressions
    pub unmatched: UnmatchedPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            default_head: 5,
            max_head: 100_000,
            max_forecast_periods: 20,
            normality_alpha: 0.05,
            unmatched: UnmatchedPolicy::ReturnTable,
        }
    }
}
