//! Parsed form of a query expression
//!
//! One variant per supported expression shape. Parsing produces a
//! `Command`; evaluation never looks at the expression text again.

use crate::table::{Row, Table, Value};
use std::cmp::Ordering;

/// Comparison operator of a boolean filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl CompareOp {
    pub fn parse(op: &str) -> Option<Self> {
        Some(match op {
            ">" => CompareOp::Gt,
            "<" => CompareOp::Lt,
            ">=" => CompareOp::Ge,
            "<=" => CompareOp::Le,
            "==" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            _ => return None,
        })
    }
}

/// `column OP literal`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: CompareOp,
    pub value: Value,
}

impl Predicate {
    /// Null cells only satisfy `!=`. Ordering comparisons need two numbers
    /// or two strings.
    pub fn matches(&self, cell: &Value) -> bool {
        match (self.op, self.ordering(cell)) {
            (CompareOp::Eq, _) => cell.loose_eq(&self.value),
            (CompareOp::Ne, _) => !cell.loose_eq(&self.value),
            (_, None) => false,
            (CompareOp::Gt, Some(ord)) => ord.is_gt(),
            (CompareOp::Lt, Some(ord)) => ord.is_lt(),
            (CompareOp::Ge, Some(ord)) => ord.is_ge(),
            (CompareOp::Le, Some(ord)) => ord.is_le(),
        }
    }

    /// `cell` relative to the literal, if the two are comparable
    fn ordering(&self, cell: &Value) -> Option<Ordering> {
        match (cell, &self.value) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            _ => cell.as_f64()?.partial_cmp(&self.value.as_f64()?),
        }
    }

    pub fn matches_row(&self, table: &Table, row: &Row) -> bool {
        self.matches(table.value(row, &self.column))
    }
}

/// A column operand, optionally restricted by a boolean filter
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRef {
    pub column: String,
    pub filter: Option<Predicate>,
}

impl SeriesRef {
    pub fn includes(&self, table: &Table, row: &Row) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |p| p.matches_row(table, row))
    }
}

/// Group-by aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl Aggregation {
    pub const NAMES: &'static str = "sum, mean, count, min, max";

    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "sum" => Aggregation::Sum,
            "mean" => Aggregation::Mean,
            "count" => Aggregation::Count,
            "min" => Aggregation::Min,
            "max" => Aggregation::Max,
            _ => return None,
        })
    }
}

/// Single-column statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnStat {
    Mean,
    Median,
    Std,
    Var,
    Sum,
    Min,
    Max,
    Count,
    Nunique,
    Mode,
    Skew,
    Kurt,
    Unique,
    Quantile(f64),
}

impl ColumnStat {
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "mean" => ColumnStat::Mean,
            "median" => ColumnStat::Median,
            "std" => ColumnStat::Std,
            "var" => ColumnStat::Var,
            "sum" => ColumnStat::Sum,
            "min" => ColumnStat::Min,
            "max" => ColumnStat::Max,
            "count" => ColumnStat::Count,
            "nunique" => ColumnStat::Nunique,
            "mode" => ColumnStat::Mode,
            "skew" => ColumnStat::Skew,
            "kurt" | "kurtosis" => ColumnStat::Kurt,
            "unique" => ColumnStat::Unique,
            _ => return None,
        })
    }

    /// Output field name
    pub fn name(&self) -> &'static str {
        match self {
            ColumnStat::Mean => "mean",
            ColumnStat::Median => "median",
            ColumnStat::Std => "std",
            ColumnStat::Var => "var",
            ColumnStat::Sum => "sum",
            ColumnStat::Min => "min",
            ColumnStat::Max => "max",
            ColumnStat::Count => "count",
            ColumnStat::Nunique => "nunique",
            ColumnStat::Mode => "mode",
            ColumnStat::Skew => "skew",
            ColumnStat::Kurt => "kurt",
            ColumnStat::Unique => "unique",
            ColumnStat::Quantile(_) => "quantile",
        }
    }
}

/// Correlation or covariance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixKind {
    Correlation,
    Covariance,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Head(usize),
    Tail(usize),
    Shape,
    Columns,
    Dtypes,
    Info,
    Len,
    Describe {
        columns: Option<Vec<String>>,
    },
    ValueCounts {
        column: String,
    },
    GroupBy {
        keys: Vec<String>,
        target: Option<String>,
        agg: Aggregation,
    },
    SortValues {
        column: String,
        ascending: bool,
    },
    Matrix {
        kind: MatrixKind,
        columns: Option<Vec<String>>,
    },
    PairStat {
        kind: MatrixKind,
        x: String,
        y: String,
    },
    ColumnStat {
        column: String,
        stat: ColumnStat,
    },
    Select {
        columns: Vec<String>,
    },
    Filter {
        predicate: Predicate,
        projection: Option<Vec<String>>,
    },
    OneSampleTTest {
        series: SeriesRef,
        mu: f64,
    },
    TwoSampleTTest {
        a: SeriesRef,
        b: SeriesRef,
    },
    ChiSquare {
        rows: SeriesRef,
        cols: SeriesRef,
    },
    Normality {
        series: SeriesRef,
    },
    PearsonTest {
        x: SeriesRef,
        y: SeriesRef,
    },
    LinRegress {
        x: SeriesRef,
        y: SeriesRef,
    },
    MultipleRegression {
        y: SeriesRef,
        x: Vec<String>,
    },
    Trend {
        series: SeriesRef,
    },
    Forecast {
        series: SeriesRef,
        periods: i64,
    },
}

impl Command {
    /// Every column the command reads, in first-mention order
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        match self {
            Command::Head(_)
            | Command::Tail(_)
            | Command::Shape
            | Command::Columns
            | Command::Dtypes
            | Command::Info
            | Command::Len => {}
            Command::Describe { columns } | Command::Matrix { columns, .. } => {
                if let Some(cols) = columns {
                    out.extend(cols.iter().map(String::as_str));
                }
            }
            Command::ValueCounts { column }
            | Command::SortValues { column, .. }
            | Command::ColumnStat { column, .. } => out.push(column),
            Command::GroupBy { keys, target, .. } => {
                out.extend(keys.iter().map(String::as_str));
                if let Some(t) = target {
                    out.push(t);
                }
            }
            Command::PairStat { x, y, .. } => {
                out.push(x);
                out.push(y);
            }
            Command::Select { columns } => out.extend(columns.iter().map(String::as_str)),
            Command::Filter {
                predicate,
                projection,
            } => {
                out.push(&predicate.column);
                if let Some(cols) = projection {
                    out.extend(cols.iter().map(String::as_str));
                }
            }
            Command::OneSampleTTest { series, .. }
            | Command::Normality { series }
            | Command::Trend { series }
            | Command::Forecast { series, .. } => push_series(series, &mut out),
            Command::TwoSampleTTest { a, b } => {
                push_series(a, &mut out);
                push_series(b, &mut out);
            }
            Command::ChiSquare { rows, cols } => {
                push_series(rows, &mut out);
                push_series(cols, &mut out);
            }
            Command::PearsonTest { x, y } | Command::LinRegress { x, y } => {
                push_series(x, &mut out);
                push_series(y, &mut out);
            }
            Command::MultipleRegression { y, x } => {
                push_series(y, &mut out);
                out.extend(x.iter().map(String::as_str));
            }
        }
        out
    }
}

fn push_series<'a>(s: &'a SeriesRef, out: &mut Vec<&'a str>) {
    if let Some(p) = &s.filter {
        out.push(&p.column);
    }
    out.push(&s.column);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(op: CompareOp, value: Value) -> Predicate {
        Predicate {
            column: "c".into(),
            op,
            value,
        }
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt = pred(CompareOp::Gt, Value::Number(3.0));
        assert!(gt.matches(&Value::Number(4.0)));
        assert!(!gt.matches(&Value::Number(3.0)));
        assert!(gt.matches(&Value::Text("10".into())));
        assert!(!gt.matches(&Value::Null));

        let le = pred(CompareOp::Le, Value::Number(3.0));
        assert!(le.matches(&Value::Number(3.0)));
    }

    #[test]
    fn test_ordering_needs_comparable_operands() {
        let ge = pred(CompareOp::Ge, Value::Text("m".into()));
        assert!(ge.matches(&Value::Text("m".into())));
        assert!(ge.matches(&Value::Text("z".into())));
        assert!(!ge.matches(&Value::Text("a".into())));

        let lt = pred(CompareOp::Lt, Value::Number(5.0));
        assert!(!lt.matches(&Value::Text("abc".into())));
        assert!(!lt.matches(&Value::Number(f64::NAN)));
    }

    #[test]
    fn test_text_equality() {
        let eq = pred(CompareOp::Eq, Value::Text("A".into()));
        assert!(eq.matches(&Value::Text("A".into())));
        assert!(!eq.matches(&Value::Text("B".into())));

        let ne = pred(CompareOp::Ne, Value::Text("A".into()));
        assert!(ne.matches(&Value::Null));
    }

    #[test]
    fn test_referenced_columns_include_filters() {
        let cmd = Command::TwoSampleTTest {
            a: SeriesRef {
                column: "v".into(),
                filter: Some(pred(CompareOp::Eq, "A".into())),
            },
            b: SeriesRef {
                column: "w".into(),
                filter: None,
            },
        };
        assert_eq!(cmd.referenced_columns(), vec!["c", "v", "w"]);
    }
}
