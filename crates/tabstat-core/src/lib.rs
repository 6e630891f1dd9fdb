//! tabstat-core: tabular statistical query engine
//!
//! Evaluates a restricted, pandas-like expression against an in-memory
//! table and returns a uniform tabular result. The statistics library
//! underneath (descriptive statistics, correlation, hypothesis tests,
//! regression, trend and forecast) is usable on its own over plain `f64`
//! slices.

pub mod descriptive;
pub mod distributions;
pub mod errors;
pub mod extract;
pub mod models;
pub mod query;
pub mod table;
pub mod tests;
pub mod types;

pub use errors::{QueryError, QueryResult};
pub use query::{execute, execute_with_options, Command, ResultSet};
pub use table::{DType, Row, Table, Value};
pub use types::*;
