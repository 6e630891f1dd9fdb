//! Numeric extraction helpers
//!
//! Univariate helpers drop null/non-numeric cells per column. Bivariate and
//! multivariate helpers keep a row only when every referenced column is
//! numeric in that row (pairwise-complete).

use crate::table::{DType, Row, Table};

/// Numeric values of one column, in row order
pub fn numeric_values(table: &Table, column: &str) -> Vec<f64> {
    numeric_values_in(table, table.rows().iter(), column)
}

/// Numeric values of one column over a subset of rows
pub fn numeric_values_in<'a>(
    table: &Table,
    rows: impl Iterator<Item = &'a Row>,
    column: &str,
) -> Vec<f64> {
    rows.filter_map(|row| table.value(row, column).as_f64())
        .collect()
}

/// Row-aligned numeric view of a column, NaN marking missing cells
pub fn aligned_values(table: &Table, column: &str) -> Vec<f64> {
    table
        .rows()
        .iter()
        .map(|row| table.value(row, column).as_f64().unwrap_or(f64::NAN))
        .collect()
}

/// Pairwise-complete values of two columns
pub fn paired_values(table: &Table, x: &str, y: &str) -> (Vec<f64>, Vec<f64>) {
    table
        .rows()
        .iter()
        .filter_map(|row| {
            let a = table.value(row, x).as_f64()?;
            let b = table.value(row, y).as_f64()?;
            Some((a, b))
        })
        .unzip()
}

/// Complete cases over several columns, returned column-major
pub fn complete_cases<S: AsRef<str>>(table: &Table, columns: &[S]) -> Vec<Vec<f64>> {
    complete_cases_in(table, table.rows().iter(), columns)
}

/// Complete cases over a subset of rows
pub fn complete_cases_in<'a, S: AsRef<str>>(
    table: &Table,
    rows: impl Iterator<Item = &'a Row>,
    columns: &[S],
) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
    let mut buf = Vec::with_capacity(columns.len());

    for row in rows {
        buf.clear();
        for col in columns {
            match table.value(row, col.as_ref()).as_f64() {
                Some(v) => buf.push(v),
                None => break,
            }
        }
        if buf.len() == columns.len() {
            for (dst, v) in out.iter_mut().zip(&buf) {
                dst.push(*v);
            }
        }
    }

    out
}

/// Columns whose dtype is numeric, in table order
pub fn numeric_columns(table: &Table) -> Vec<String> {
    table
        .columns()
        .iter()
        .filter(|c| table.dtype(c) == Some(DType::Numeric))
        .cloned()
        .collect()
}
