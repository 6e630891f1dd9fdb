use thiserror::Error;

/// Errors raised while evaluating a query expression against a table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    // Expression errors
    #[error("Column(s) not found: {}", .columns.join(", "))]
    ColumnNotFound { columns: Vec<String> },

    #[error("Invalid syntax for {operation}: expected {expected}")]
    InvalidSyntax {
        operation: &'static str,
        expected: &'static str,
    },

    #[error("Domain error: {0}")]
    DomainError(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    // Input errors
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QueryError {
    pub fn column_not_found(column: impl Into<String>) -> Self {
        QueryError::ColumnNotFound {
            columns: vec![column.into()],
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(e: serde_json::Error) -> Self {
        QueryError::Serialization(e.to_string())
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
