//! Regression, trend and forecast models

mod forecast;
mod linear;
mod trend;

pub use forecast::{forecast, MAX_FORECAST_PERIODS};
pub use linear::{linear_regression, multiple_linear_regression};
pub use trend::trend_analysis;
