//! Command evaluation
//!
//! Table transforms (head, selection, sort, group/aggregate, value counts)
//! and the glue that feeds extracted series into the statistics library.
//! Columns have been validated before anything here runs.

use super::command::{Aggregation, ColumnStat, Command, MatrixKind, Predicate, SeriesRef};
use super::result::Frame;
use crate::descriptive::{self, Summary};
use crate::extract::{
    aligned_values, complete_cases, complete_cases_in, numeric_columns, numeric_values,
    numeric_values_in, paired_values,
};
use crate::models::{forecast, linear_regression, multiple_linear_regression, trend_analysis};
use crate::table::{DType, Row, Table, Value};
use crate::tests::{
    chi_square_test, contingency_table, correlation_matrix, covariance, covariance_matrix,
    normality_test, one_sample_t_test, pearson_correlation, pearson_test, two_sample_t_test,
};
use crate::types::EngineOptions;
use std::cmp::Ordering;
use std::iter;

pub(crate) fn evaluate(table: &Table, command: &Command, options: &EngineOptions) -> Frame {
    match command {
        Command::Head(n) => rows_frame(table.columns(), table.rows().iter().take(*n)),
        Command::Tail(n) => {
            let skip = table.row_count().saturating_sub(*n);
            rows_frame(table.columns(), table.rows().iter().skip(skip))
        }
        Command::Shape => {
            let mut frame = Frame::new(["rows", "columns"]);
            frame.push(vec![table.row_count().into(), table.columns().len().into()]);
            frame
        }
        Command::Columns => {
            let mut frame = Frame::new(["column"]);
            for c in table.columns() {
                frame.push(vec![c.as_str().into()]);
            }
            frame
        }
        Command::Dtypes => {
            let mut frame = Frame::new(["column", "dtype"]);
            for c in table.columns() {
                frame.push(vec![c.as_str().into(), dtype_name(table, c).into()]);
            }
            frame
        }
        Command::Info => info(table),
        Command::Len => Frame::scalar("len", table.row_count()),
        Command::Describe { columns } => describe(table, columns.as_deref()),
        Command::ValueCounts { column } => value_counts(table, column),
        Command::GroupBy { keys, target, agg } => group_by(table, keys, target.as_deref(), *agg),
        Command::SortValues { column, ascending } => sort_values(table, column, *ascending),
        Command::Matrix { kind, columns } => matrix(table, *kind, columns.as_deref()),
        Command::PairStat { kind, x, y } => {
            let (a, b) = paired_values(table, x, y);
            match kind {
                MatrixKind::Correlation => Frame::scalar("correlation", pearson_correlation(&a, &b)),
                MatrixKind::Covariance => Frame::scalar("covariance", covariance(&a, &b)),
            }
        }
        Command::ColumnStat { column, stat } => column_stat(table, column, *stat),
        Command::Select { columns } => rows_frame(columns, table.rows().iter()),
        Command::Filter {
            predicate,
            projection,
        } => filter(table, predicate, projection.as_deref()),
        Command::OneSampleTTest { series, mu } => {
            let r = one_sample_t_test(&series_values(table, series), *mu);
            let mut frame = Frame::new(["statistic", "p_value", "df", "n", "method"]);
            frame.push(vec![
                r.statistic.into(),
                r.p_value.into(),
                r.df.into(),
                r.n1.into(),
                r.method.into(),
            ]);
            frame
        }
        Command::TwoSampleTTest { a, b } => {
            let r = two_sample_t_test(&series_values(table, a), &series_values(table, b));
            let mut frame = Frame::new(["statistic", "p_value", "df", "n1", "n2", "method"]);
            frame.push(vec![
                r.statistic.into(),
                r.p_value.into(),
                r.df.into(),
                r.n1.into(),
                r.n2.into(),
                r.method.into(),
            ]);
            frame
        }
        Command::ChiSquare { rows, cols } => chi_square(table, rows, cols),
        Command::Normality { series } => {
            let r = normality_test(&series_values(table, series), options.normality_alpha);
            let mut frame = Frame::new(["statistic", "p_value", "is_normal", "n", "method"]);
            frame.push(vec![
                r.statistic.into(),
                r.p_value.into(),
                r.is_normal.into(),
                r.n.into(),
                r.method.into(),
            ]);
            frame
        }
        Command::PearsonTest { x, y } => {
            let (a, b) = paired_series(table, x, y);
            let r = pearson_test(&a, &b);
            let mut frame = Frame::new(["correlation", "statistic", "p_value", "n"]);
            frame.push(vec![r.r.into(), r.statistic.into(), r.p_value.into(), r.n.into()]);
            frame
        }
        Command::LinRegress { x, y } => {
            let (a, b) = paired_series(table, x, y);
            let fit = linear_regression(&a, &b);
            let mut frame =
                Frame::new(["slope", "intercept", "r_squared", "standard_error", "n"]);
            frame.push(vec![
                fit.slope.into(),
                fit.intercept.into(),
                fit.r_squared.into(),
                fit.standard_error.into(),
                a.len().into(),
            ]);
            frame
        }
        Command::MultipleRegression { y, x } => multiple_regression(table, y, x),
        Command::Trend { series } => {
            let r = trend_analysis(&series_values(table, series));
            let mut frame = Frame::new([
                "trend_type",
                "strength",
                "slope",
                "intercept",
                "r_squared",
                "description",
                "n",
            ]);
            frame.push(vec![
                r.trend_type.as_str().into(),
                r.strength.as_str().into(),
                r.slope.into(),
                r.intercept.into(),
                r.r_squared.into(),
                r.description.into(),
                r.n.into(),
            ]);
            frame
        }
        Command::Forecast { series, periods } => forecast_frame(table, series, *periods),
    }
}

/// The unmodified table
pub(crate) fn whole_table(table: &Table) -> Frame {
    rows_frame(table.columns(), table.rows().iter())
}

fn rows_frame<'a>(columns: &[String], rows: impl Iterator<Item = &'a Row>) -> Frame {
    let mut frame = Frame::new(columns.iter().cloned());
    for row in rows {
        frame.push_projected(row);
    }
    frame
}

fn dtype_name(table: &Table, column: &str) -> &'static str {
    table.dtype(column).map_or("", |d| d.as_str())
}

fn info(table: &Table) -> Frame {
    let mut frame = Frame::new(["column", "dtype", "non_null", "null"]);
    for c in table.columns() {
        let non_null = table
            .rows()
            .iter()
            .filter(|r| !table.value(r, c).is_null())
            .count();
        frame.push(vec![
            c.as_str().into(),
            dtype_name(table, c).into(),
            non_null.into(),
            (table.row_count() - non_null).into(),
        ]);
    }
    frame
}

fn describe(table: &Table, columns: Option<&[String]>) -> Frame {
    let columns = columns.map_or_else(|| numeric_columns(table), <[String]>::to_vec);
    let summaries: Vec<[f64; 8]> = columns
        .iter()
        .map(|c| descriptive::describe(&numeric_values(table, c)).values())
        .collect();

    let mut frame = Frame::new(iter::once("statistic".to_string()).chain(columns));
    for (i, label) in Summary::LABELS.iter().enumerate() {
        let mut values = vec![Value::from(*label)];
        values.extend(summaries.iter().map(|s| Value::Number(s[i])));
        frame.push(values);
    }
    frame
}

fn cmp_keys(a: &[Value], b: &[Value]) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Row indices grouped by their key values, groups in ascending key order.
/// Rows with a null in any key column belong to no group.
fn group_rows(table: &Table, keys: &[String]) -> Vec<(Vec<Value>, Vec<usize>)> {
    let mut keyed: Vec<(Vec<Value>, usize)> = table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let key: Vec<Value> = keys.iter().map(|k| table.value(row, k).clone()).collect();
            (key, i)
        })
        .filter(|(key, _)| key.iter().all(|v| !v.is_null()))
        .collect();

    // stable: indices stay in row order within a group
    keyed.sort_by(|a, b| cmp_keys(&a.0, &b.0));

    keyed
        .chunk_by(|a, b| cmp_keys(&a.0, &b.0).is_eq())
        .map(|chunk| {
            let indices = chunk.iter().map(|(_, i)| *i).collect();
            (chunk[0].0.clone(), indices)
        })
        .collect()
}

fn first_key(key: Vec<Value>) -> Value {
    key.into_iter().next().unwrap_or_default()
}

fn value_counts(table: &Table, column: &str) -> Frame {
    let mut groups = group_rows(table, &[column.to_string()]);
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then(a.1[0].cmp(&b.1[0])));

    let mut frame = Frame::new([column, "count"]);
    for (key, indices) in groups {
        frame.push(vec![first_key(key), indices.len().into()]);
    }
    frame
}

fn group_by(table: &Table, keys: &[String], target: Option<&str>, agg: Aggregation) -> Frame {
    let targets: Vec<String> = match target {
        Some(t) => vec![t.to_string()],
        None if agg == Aggregation::Count => table
            .columns()
            .iter()
            .filter(|c| !keys.contains(c))
            .cloned()
            .collect(),
        None => numeric_columns(table)
            .into_iter()
            .filter(|c| !keys.contains(c))
            .collect(),
    };

    let mut frame = Frame::new(keys.iter().chain(&targets).cloned());
    for (key, indices) in group_rows(table, keys) {
        let mut values = key;
        for t in &targets {
            let rows = indices.iter().map(|&i| &table.rows()[i]);
            values.push(aggregate(table, rows, t, agg));
        }
        frame.push(values);
    }
    frame
}

/// Count ignores nulls; the numeric aggregates of an all-null group are null
/// except `sum`, which is 0.
fn aggregate<'a>(
    table: &'a Table,
    rows: impl Iterator<Item = &'a Row>,
    column: &str,
    agg: Aggregation,
) -> Value {
    let reduce: fn(&[f64]) -> f64 = match agg {
        Aggregation::Count => {
            return rows
                .filter(|r| !table.value(r, column).is_null())
                .count()
                .into()
        }
        Aggregation::Sum => descriptive::sum,
        Aggregation::Mean => descriptive::mean,
        Aggregation::Min => descriptive::min,
        Aggregation::Max => descriptive::max,
    };
    let values = numeric_values_in(table, rows, column);
    if values.is_empty() && agg != Aggregation::Sum {
        Value::Null
    } else {
        reduce(&values).into()
    }
}

/// Stable sort on one column; nulls go last in either direction.
fn sort_values(table: &Table, column: &str, ascending: bool) -> Frame {
    let mut rows: Vec<&Row> = table.rows().iter().collect();
    rows.sort_by(|a, b| {
        let (x, y) = (table.value(a, column), table.value(b, column));
        match (x.is_null(), y.is_null()) {
            (false, false) if ascending => x.total_cmp(y),
            (false, false) => y.total_cmp(x),
            (x_null, y_null) => x_null.cmp(&y_null),
        }
    });
    rows_frame(table.columns(), rows.into_iter())
}

fn matrix(table: &Table, kind: MatrixKind, columns: Option<&[String]>) -> Frame {
    let columns = columns.map_or_else(|| numeric_columns(table), <[String]>::to_vec);
    let data: Vec<Vec<f64>> = columns.iter().map(|c| aligned_values(table, c)).collect();
    let m = match kind {
        MatrixKind::Correlation => correlation_matrix(&data),
        MatrixKind::Covariance => covariance_matrix(&data),
    };

    let mut frame = Frame::new(iter::once("index".to_string()).chain(columns.iter().cloned()));
    for (name, row) in columns.iter().zip(m) {
        let mut values = vec![Value::from(name.as_str())];
        values.extend(row.into_iter().map(Value::Number));
        frame.push(values);
    }
    frame
}

fn column_stat(table: &Table, column: &str, stat: ColumnStat) -> Frame {
    let name = stat.name();
    let reduce: fn(&[f64]) -> f64 = match stat {
        ColumnStat::Mean => descriptive::mean,
        ColumnStat::Median => descriptive::median,
        ColumnStat::Std => descriptive::std,
        ColumnStat::Var => descriptive::variance,
        ColumnStat::Sum => descriptive::sum,
        ColumnStat::Min => descriptive::min,
        ColumnStat::Max => descriptive::max,
        ColumnStat::Skew => descriptive::skewness,
        ColumnStat::Kurt => descriptive::kurtosis,
        ColumnStat::Quantile(q) => {
            return Frame::scalar(name, descriptive::percentile(&numeric_values(table, column), q))
        }
        ColumnStat::Count => {
            let count = table
                .rows()
                .iter()
                .filter(|r| !table.value(r, column).is_null())
                .count();
            return Frame::scalar(name, count);
        }
        ColumnStat::Nunique => {
            return Frame::scalar(name, group_rows(table, &[column.to_string()]).len())
        }
        ColumnStat::Unique => {
            let mut groups = group_rows(table, &[column.to_string()]);
            groups.sort_by_key(|(_, indices)| indices[0]);
            let mut frame = Frame::new([column]);
            for (key, _) in groups {
                frame.push(vec![first_key(key)]);
            }
            return frame;
        }
        ColumnStat::Mode => return mode(table, column),
    };
    Frame::scalar(name, reduce(&numeric_values(table, column)))
}

/// Every most-frequent value, ascending
fn mode(table: &Table, column: &str) -> Frame {
    let mut frame = Frame::new(["mode"]);
    if table.dtype(column) == Some(DType::Numeric) {
        for v in descriptive::mode(&numeric_values(table, column)) {
            frame.push(vec![v.into()]);
        }
        return frame;
    }

    let groups = group_rows(table, &[column.to_string()]);
    let best = groups.iter().map(|(_, idx)| idx.len()).max().unwrap_or(0);
    for (key, indices) in groups {
        if indices.len() == best {
            frame.push(vec![first_key(key)]);
        }
    }
    frame
}

fn filter(table: &Table, predicate: &Predicate, projection: Option<&[String]>) -> Frame {
    let columns = projection.unwrap_or(table.columns());
    rows_frame(
        columns,
        table
            .rows()
            .iter()
            .filter(|r| predicate.matches_row(table, r)),
    )
}

/// Numeric values of a possibly filtered series
fn series_values(table: &Table, series: &SeriesRef) -> Vec<f64> {
    numeric_values_in(
        table,
        table.rows().iter().filter(|r| series.includes(table, r)),
        &series.column,
    )
}

/// Rows passing both filters where both columns are numeric
fn paired_series(table: &Table, x: &SeriesRef, y: &SeriesRef) -> (Vec<f64>, Vec<f64>) {
    if x.filter.is_none() && y.filter.is_none() {
        return paired_values(table, &x.column, &y.column);
    }
    let mut data = complete_cases_in(
        table,
        table
            .rows()
            .iter()
            .filter(|r| x.includes(table, r) && y.includes(table, r)),
        &[x.column.as_str(), y.column.as_str()],
    );
    let ys = data.pop().unwrap_or_default();
    let xs = data.pop().unwrap_or_default();
    (xs, ys)
}

fn chi_square(table: &Table, rows: &SeriesRef, cols: &SeriesRef) -> Frame {
    let pairs: Vec<(String, String)> = table
        .rows()
        .iter()
        .filter(|r| rows.includes(table, r) && cols.includes(table, r))
        .filter_map(|r| {
            let a = table.value(r, &rows.column);
            let b = table.value(r, &cols.column);
            (!a.is_null() && !b.is_null()).then(|| (a.to_string(), b.to_string()))
        })
        .collect();
    let r = chi_square_test(&contingency_table(&pairs).counts);

    let mut frame = Frame::new(["chi_square", "p_value", "df", "n", "method"]);
    frame.push(vec![
        r.statistic.into(),
        r.p_value.into(),
        r.df.into(),
        r.n.into(),
        r.method.into(),
    ]);
    frame
}

/// One row per term, intercept first
fn multiple_regression(table: &Table, y: &SeriesRef, x: &[String]) -> Frame {
    let columns: Vec<&str> = iter::once(y.column.as_str())
        .chain(x.iter().map(String::as_str))
        .collect();
    let mut data = match &y.filter {
        None => complete_cases(table, &columns),
        Some(p) => complete_cases_in(
            table,
            table.rows().iter().filter(|r| p.matches_row(table, r)),
            &columns,
        ),
    };
    let ys = data.remove(0);
    let fit = multiple_linear_regression(&data, &ys);

    let mut frame = Frame::new([
        "term",
        "coefficient",
        "r_squared",
        "adj_r_squared",
        "standard_error",
        "n",
    ]);
    if fit.coefficients.is_empty() {
        frame.push(vec![
            "insufficient_data".into(),
            Value::Null,
            0.0.into(),
            0.0.into(),
            0.0.into(),
            ys.len().into(),
        ]);
        return frame;
    }

    let terms = iter::once("intercept").chain(x.iter().map(String::as_str));
    for (term, coefficient) in terms.zip(&fit.coefficients) {
        frame.push(vec![
            term.into(),
            (*coefficient).into(),
            fit.r_squared.into(),
            fit.adj_r_squared.into(),
            fit.standard_error.into(),
            fit.n_observations.into(),
        ]);
    }
    frame
}

/// `periods` forecast rows followed by one summary row
fn forecast_frame(table: &Table, series: &SeriesRef, periods: i64) -> Frame {
    let r = forecast(&series_values(table, series), periods);
    let method = r.method.as_str();

    let mut frame = Frame::new([
        "type",
        "period",
        "forecast",
        "lower_bound",
        "upper_bound",
        "method",
        "slope",
        "r_squared",
    ]);
    for (i, f) in r.forecasts.iter().enumerate() {
        frame.push(vec![
            "forecast".into(),
            (i + 1).into(),
            (*f).into(),
            r.lower_bounds[i].into(),
            r.upper_bounds[i].into(),
            method.into(),
        ]);
    }
    frame.push(vec![
        "summary".into(),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
        method.into(),
        r.slope.into(),
        r.r_squared.into(),
    ]);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::command::CompareOp;
    use approx::assert_abs_diff_eq;

    fn sales() -> Table {
        Table::from_columns(vec![
            (
                "region",
                DType::Text,
                vec![
                    "north".into(),
                    "south".into(),
                    "north".into(),
                    Value::Null,
                    "south".into(),
                    "east".into(),
                ],
            ),
            (
                "units",
                DType::Numeric,
                vec![
                    10.0.into(),
                    4.0.into(),
                    6.0.into(),
                    7.0.into(),
                    Value::Null,
                    3.0.into(),
                ],
            ),
            (
                "price",
                DType::Numeric,
                vec![
                    2.0.into(),
                    3.0.into(),
                    2.0.into(),
                    5.0.into(),
                    4.0.into(),
                    1.0.into(),
                ],
            ),
        ])
        .unwrap()
    }

    fn run(command: Command) -> crate::query::ResultSet {
        evaluate(&sales(), &command, &EngineOptions::default()).finish(0.0)
    }

    #[test]
    fn test_tail() {
        let r = run(Command::Tail(2));
        assert_eq!(r.row_count, 2);
        assert_eq!(r.get(0, "price"), &Value::Number(4.0));
        assert_eq!(r.get(1, "region"), &Value::Text("east".into()));
    }

    #[test]
    fn test_value_counts_descending() {
        let r = run(Command::ValueCounts {
            column: "region".into(),
        });
        assert_eq!(r.columns, vec!["region", "count"]);
        assert_eq!(r.row_count, 3);
        // north and south tie at 2; north appears first
        assert_eq!(r.get(0, "region"), &Value::Text("north".into()));
        assert_eq!(r.get(1, "region"), &Value::Text("south".into()));
        assert_eq!(r.number(2, "count"), Some(1.0));
    }

    #[test]
    fn test_groupby_mean_over_numeric_columns() {
        let r = run(Command::GroupBy {
            keys: vec!["region".into()],
            target: None,
            agg: Aggregation::Mean,
        });
        assert_eq!(r.columns, vec!["region", "units", "price"]);
        assert_eq!(r.row_count, 3);
        assert_eq!(r.get(0, "region"), &Value::Text("east".into()));
        assert_eq!(r.number(1, "units"), Some(8.0));
        // south has one null unit, mean over the remaining value
        assert_eq!(r.number(2, "units"), Some(4.0));
        assert_eq!(r.number(2, "price"), Some(3.5));
    }

    #[test]
    fn test_groupby_count_ignores_nulls() {
        let r = run(Command::GroupBy {
            keys: vec!["region".into()],
            target: Some("units".into()),
            agg: Aggregation::Count,
        });
        assert_eq!(r.number(2, "units"), Some(1.0));
    }

    #[test]
    fn test_sort_descending_nulls_last() {
        let r = run(Command::SortValues {
            column: "units".into(),
            ascending: false,
        });
        assert_eq!(r.number(0, "units"), Some(10.0));
        assert_eq!(r.get(5, "units"), &Value::Null);

        let r = run(Command::SortValues {
            column: "units".into(),
            ascending: true,
        });
        assert_eq!(r.number(0, "units"), Some(3.0));
        assert_eq!(r.get(5, "units"), &Value::Null);
    }

    #[test]
    fn test_describe_labels() {
        let r = run(Command::Describe { columns: None });
        assert_eq!(r.columns, vec!["statistic", "units", "price"]);
        assert_eq!(r.row_count, 8);
        assert_eq!(r.get(4, "statistic"), &Value::Text("25%".into()));
        assert_eq!(r.number(0, "units"), Some(5.0));
        assert_eq!(r.number(7, "price"), Some(5.0));
    }

    #[test]
    fn test_text_mode_and_unique() {
        let r = run(Command::ColumnStat {
            column: "region".into(),
            stat: ColumnStat::Mode,
        });
        assert_eq!(r.row_count, 2);
        assert_eq!(r.get(0, "mode"), &Value::Text("north".into()));

        let r = run(Command::ColumnStat {
            column: "region".into(),
            stat: ColumnStat::Unique,
        });
        assert_eq!(r.row_count, 3);
        assert_eq!(r.get(2, "region"), &Value::Text("east".into()));
    }

    #[test]
    fn test_filter_with_projection() {
        let r = run(Command::Filter {
            predicate: Predicate {
                column: "price".into(),
                op: CompareOp::Ge,
                value: Value::Number(3.0),
            },
            projection: Some(vec!["units".into()]),
        });
        assert_eq!(r.columns, vec!["units"]);
        assert_eq!(r.row_count, 3);
        assert_eq!(r.number(0, "units"), Some(4.0));
    }

    #[test]
    fn test_filtered_series_pairs() {
        let only_north = SeriesRef {
            column: "units".into(),
            filter: Some(Predicate {
                column: "region".into(),
                op: CompareOp::Eq,
                value: "north".into(),
            }),
        };
        let price = SeriesRef {
            column: "price".into(),
            filter: None,
        };
        let (x, y) = paired_series(&sales(), &only_north, &price);
        assert_eq!(x, vec![10.0, 6.0]);
        assert_eq!(y, vec![2.0, 2.0]);
    }

    #[test]
    fn test_multiple_regression_terms() {
        let r = run(Command::MultipleRegression {
            y: SeriesRef {
                column: "price".into(),
                filter: None,
            },
            x: vec!["units".into()],
        });
        assert_eq!(r.get(0, "term"), &Value::Text("intercept".into()));
        assert_eq!(r.row_count, 2);
        assert_abs_diff_eq!(r.number(0, "n").unwrap(), 5.0);
    }

    #[test]
    fn test_forecast_rows() {
        let r = run(Command::Forecast {
            series: SeriesRef {
                column: "price".into(),
                filter: None,
            },
            periods: 3,
        });
        assert_eq!(r.row_count, 4);
        assert_eq!(r.get(3, "type"), &Value::Text("summary".into()));
        assert_eq!(r.get(0, "method"), &Value::Text("linear_trend".into()));
        assert_eq!(r.number(2, "period"), Some(3.0));
    }
}
