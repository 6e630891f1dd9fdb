//! In-memory table model
//!
//! Tables are built by an external loader (file import, database result)
//! and are only ever read by the engine.

use crate::errors::{QueryError, QueryResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

/// Column data type, inferred once by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Numeric,
    Boolean,
    Datetime,
    Text,
}

impl DType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Numeric => "numeric",
            DType::Boolean => "boolean",
            DType::Datetime => "datetime",
            DType::Text => "text",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Numeric coercion used by every statistical operation.
    ///
    /// Finite numbers pass through, booleans map to 1/0 and text is parsed.
    /// Anything else (null, NaN, unparseable text) is not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            Value::Number(n) => *n,
            Value::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Text(s) => s.trim().parse::<f64>().ok()?,
            Value::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    fn type_rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Number(_) => 1,
            Value::Text(_) => 2,
            Value::Null => 3,
        }
    }

    /// Total order used for sorting and grouping; nulls sort last.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }

    /// Loose equality used by boolean filters: numbers compare numerically
    /// (so `'3'` matches `3.0`), everything else structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => self == other,
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f64)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One record, keyed by column name
pub type Row = BTreeMap<String, Value>;

/// Wire shape produced by loaders: `{columns, dtype, rows}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub dtype: HashMap<String, DType>,
    pub rows: Vec<Row>,
}

/// Immutable in-memory table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    dtype: HashMap<String, DType>,
    rows: Vec<Row>,
}

impl TryFrom<RawTable> for Table {
    type Error = QueryError;

    fn try_from(raw: RawTable) -> QueryResult<Self> {
        Table::new(raw.columns, raw.dtype, raw.rows)
    }
}

impl Table {
    /// Build a table, checking that column names are distinct, every column
    /// has a dtype and every row carries exactly the column key set.
    pub fn new(
        columns: Vec<String>,
        dtype: HashMap<String, DType>,
        rows: Vec<Row>,
    ) -> QueryResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(QueryError::InvalidTable(format!(
                    "duplicate column name '{}'",
                    col
                )));
            }
            if !dtype.contains_key(col) {
                return Err(QueryError::InvalidTable(format!(
                    "column '{}' has no dtype",
                    col
                )));
            }
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() || !columns.iter().all(|c| row.contains_key(c)) {
                return Err(QueryError::InvalidTable(format!(
                    "row {} does not match the column set",
                    i
                )));
            }
        }

        Ok(Self {
            columns,
            dtype,
            rows,
        })
    }

    /// Convenience constructor from column-major data.
    ///
    /// All columns must have the same length.
    pub fn from_columns(columns: Vec<(&str, DType, Vec<Value>)>) -> QueryResult<Self> {
        let n_rows = columns.first().map(|(_, _, v)| v.len()).unwrap_or(0);
        if let Some((name, _, values)) = columns.iter().find(|(_, _, v)| v.len() != n_rows) {
            return Err(QueryError::InvalidTable(format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                n_rows
            )));
        }

        let names: Vec<String> = columns.iter().map(|(n, _, _)| n.to_string()).collect();
        let dtype: HashMap<String, DType> =
            columns.iter().map(|(n, t, _)| (n.to_string(), *t)).collect();
        let rows: Vec<Row> = (0..n_rows)
            .map(|i| {
                columns
                    .iter()
                    .map(|(n, _, v)| (n.to_string(), v[i].clone()))
                    .collect()
            })
            .collect();

        Table::new(names, dtype, rows)
    }

    /// Parse the loader's JSON shape, then validate it like [`Table::new`]
    pub fn from_json(json: &str) -> QueryResult<Self> {
        let raw: RawTable = serde_json::from_str(json)?;
        Table::try_from(raw)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn dtype(&self, column: &str) -> Option<DType> {
        self.dtype.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Fail with `ColumnNotFound` naming every absent column.
    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> QueryResult<()> {
        let mut missing: Vec<String> = Vec::new();
        for col in columns {
            let col = col.as_ref();
            if !self.has_column(col) && !missing.iter().any(|m| m == col) {
                missing.push(col.to_string());
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(QueryError::ColumnNotFound { columns: missing })
        }
    }

    /// Cell accessor; missing keys read as null.
    pub fn value<'a>(&'a self, row: &'a Row, column: &str) -> &'a Value {
        const NULL: &Value = &Value::Null;
        row.get(column).unwrap_or(NULL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            ("a", DType::Numeric, vec![1.0.into(), 2.0.into(), Value::Null]),
            ("b", DType::Text, vec!["x".into(), "y".into(), "z".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns() {
        let t = sample();
        assert_eq!(t.row_count(), 3);
        assert_eq!(t.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(t.dtype("b"), Some(DType::Text));
    }

    #[test]
    fn test_row_key_set_enforced() {
        let mut row = Row::new();
        row.insert("a".into(), Value::Number(1.0));
        let dtype = HashMap::from([
            ("a".to_string(), DType::Numeric),
            ("b".to_string(), DType::Numeric),
        ]);
        let result = Table::new(vec!["a".into(), "b".into()], dtype, vec![row]);
        assert!(matches!(result, Err(QueryError::InvalidTable(_))));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let dtype = HashMap::from([("a".to_string(), DType::Numeric)]);
        let result = Table::new(vec!["a".into(), "a".into()], dtype, vec![]);
        assert!(matches!(result, Err(QueryError::InvalidTable(_))));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "columns": ["x", "label"],
            "dtype": {"x": "numeric", "label": "text"},
            "rows": [{"x": 1, "label": "a"}, {"x": null, "label": "b"}]
        }"#;
        let t = Table::from_json(json).unwrap();
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.rows()[0]["x"], Value::Number(1.0));
        assert!(t.rows()[1]["x"].is_null());
    }

    #[test]
    fn test_require_columns_names_missing() {
        let t = sample();
        let err = t.require_columns(&["a", "nope", "also_nope"]).unwrap_err();
        assert_eq!(
            err,
            QueryError::ColumnNotFound {
                columns: vec!["nope".into(), "also_nope".into()]
            }
        );
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(Value::Text(" 2.5 ".into()).as_f64(), Some(2.5));
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Number(f64::NAN).as_f64(), None);
        assert_eq!(Value::Text("abc".into()).as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
    }

    #[test]
    fn test_total_cmp_nulls_last() {
        let mut values = vec![Value::Null, Value::Number(2.0), Value::Number(1.0)];
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(values[0], Value::Number(1.0));
        assert!(values[2].is_null());
    }
}
