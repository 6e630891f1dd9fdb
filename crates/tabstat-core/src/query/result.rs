//! Uniform tabular response

use crate::errors::QueryResult;
use crate::table::{Row, Value};
use serde::Serialize;

/// Result of one `execute` call.
///
/// Scalar results are a single row with a fixed field name; matrix results
/// have one row per input column plus an `index` field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSet {
    /// Output field names, in display order
    pub columns: Vec<String>,
    /// Output records
    pub rows: Vec<Row>,
    /// Always `rows.len()`
    pub row_count: usize,
    /// Wall-clock time spent in `execute`
    pub execution_time_ms: f64,
}

impl ResultSet {
    /// Cell of the `row`th record, null when absent
    pub fn get(&self, row: usize, column: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&NULL)
    }

    /// Numeric cell of the `row`th record
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        match self.get(row, column) {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn to_json(&self) -> QueryResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Row-at-a-time builder for a [`ResultSet`]
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Frame {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Single-row result with one field
    pub fn scalar(name: &str, value: impl Into<Value>) -> Self {
        let mut frame = Frame::new([name]);
        frame.push(vec![value.into()]);
        frame
    }

    /// Append a row given in column order; missing trailing cells are null
    pub fn push(&mut self, values: Vec<Value>) {
        let mut values = values.into_iter();
        let row = self
            .columns
            .iter()
            .map(|c| (c.clone(), values.next().unwrap_or_default()))
            .collect();
        self.rows.push(row);
    }

    /// Append an existing record restricted to this frame's columns
    pub fn push_projected(&mut self, source: &Row) {
        let row = self
            .columns
            .iter()
            .map(|c| (c.clone(), source.get(c).cloned().unwrap_or_default()))
            .collect();
        self.rows.push(row);
    }

    pub fn finish(self, execution_time_ms: f64) -> ResultSet {
        ResultSet {
            row_count: self.rows.len(),
            columns: self.columns,
            rows: self.rows,
            execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_fills_missing_cells() {
        let mut frame = Frame::new(["a", "b"]);
        frame.push(vec![1.0.into()]);
        let result = frame.finish(0.0);
        assert_eq!(result.row_count, 1);
        assert_eq!(result.get(0, "a"), &Value::Number(1.0));
        assert_eq!(result.get(0, "b"), &Value::Null);
    }

    #[test]
    fn test_push_projected() {
        let mut source = Row::new();
        source.insert("a".into(), Value::Number(1.0));
        source.insert("b".into(), Value::Text("x".into()));

        let mut frame = Frame::new(["b"]);
        frame.push_projected(&source);
        let result = frame.finish(0.0);
        assert_eq!(result.rows[0].len(), 1);
        assert_eq!(result.get(0, "b"), &Value::Text("x".into()));
    }

    #[test]
    fn test_json_field_names() {
        let json = Frame::scalar("mean", 2.5).finish(1.5).to_json().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["rowCount"], 1);
        assert_eq!(parsed["executionTimeMs"], 1.5);
        assert_eq!(parsed["columns"][0], "mean");
        assert_eq!(parsed["rows"][0]["mean"], 2.5);
    }
}
