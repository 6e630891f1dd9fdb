//! Categorical tests
//!
//! - Chi-square test (independence)
//! - Contingency table construction

use super::ChiSquareResult;
use crate::distributions::chi_square_upper_p;
use std::collections::BTreeMap;

/// Chi-square test for independence
///
/// `table` holds observed counts, one inner vector per row. Cells whose
/// expected count is zero are skipped. Ragged or empty tables and a 1x1
/// table (`df = 0`) give `chi_square = 0, p = 1`.
///
/// The p-value uses the Wilson-Hilferty approximation.
pub fn chi_square_test(table: &[Vec<f64>]) -> ChiSquareResult {
    const METHOD: &str = "Chi-square test for independence";
    let degenerate = |n: f64| ChiSquareResult {
        statistic: 0.0,
        p_value: 1.0,
        df: 0,
        n,
        method: METHOD.into(),
    };

    let n_rows = table.len();
    let n_cols = table.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 || table.iter().any(|r| r.len() != n_cols) {
        return degenerate(0.0);
    }

    let row_totals: Vec<f64> = table.iter().map(|r| r.iter().sum()).collect();
    let col_totals: Vec<f64> = (0..n_cols)
        .map(|j| table.iter().map(|r| r[j]).sum())
        .collect();
    let total: f64 = row_totals.iter().sum();

    let df = (n_rows - 1) * (n_cols - 1);
    if df == 0 || total <= 0.0 {
        return degenerate(total);
    }

    let mut statistic = 0.0;
    for (i, row) in table.iter().enumerate() {
        for (j, &observed) in row.iter().enumerate() {
            let expected = row_totals[i] * col_totals[j] / total;
            if expected > 0.0 {
                statistic += (observed - expected).powi(2) / expected;
            }
        }
    }

    ChiSquareResult {
        statistic,
        p_value: chi_square_upper_p(statistic, df as f64),
        df,
        n: total,
        method: METHOD.into(),
    }
}

/// Cross-tabulation of two categorical series
#[derive(Debug, Clone, PartialEq)]
pub struct Contingency {
    /// Distinct row categories, sorted
    pub row_labels: Vec<String>,
    /// Distinct column categories, sorted
    pub col_labels: Vec<String>,
    /// Counts, `counts[row][col]`
    pub counts: Vec<Vec<f64>>,
}

/// Build a contingency table from paired category labels
pub fn contingency_table(pairs: &[(String, String)]) -> Contingency {
    let mut cells: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    let mut rows: BTreeMap<&str, usize> = BTreeMap::new();
    let mut cols: BTreeMap<&str, usize> = BTreeMap::new();

    for (a, b) in pairs {
        *cells.entry((a.as_str(), b.as_str())).or_insert(0.0) += 1.0;
        rows.insert(a.as_str(), 0);
        cols.insert(b.as_str(), 0);
    }
    for (i, v) in rows.values_mut().enumerate() {
        *v = i;
    }
    for (j, v) in cols.values_mut().enumerate() {
        *v = j;
    }

    let mut counts = vec![vec![0.0; cols.len()]; rows.len()];
    for ((a, b), count) in &cells {
        counts[rows[a]][cols[b]] = *count;
    }

    Contingency {
        row_labels: rows.keys().map(|s| s.to_string()).collect(),
        col_labels: cols.keys().map(|s| s.to_string()).collect(),
        counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_chi_square_independent() {
        let table = vec![vec![10.0, 10.0], vec![20.0, 20.0]];
        let result = chi_square_test(&table);

        assert_abs_diff_eq!(result.statistic, 0.0, epsilon = 1e-12);
        assert_eq!(result.df, 1);
        assert!(result.p_value > 0.9);
    }

    #[test]
    fn test_chi_square_dependent() {
        let table = vec![vec![30.0, 5.0], vec![5.0, 30.0]];
        let result = chi_square_test(&table);

        // expected 17.5 everywhere: 4 * 12.5^2 / 17.5
        assert_abs_diff_eq!(result.statistic, 4.0 * 156.25 / 17.5, epsilon = 1e-9);
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_chi_square_single_cell() {
        let result = chi_square_test(&[vec![12.0]]);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.df, 0);
    }

    #[test]
    fn test_contingency_table() {
        let pairs: Vec<(String, String)> = [("a", "x"), ("a", "y"), ("b", "x"), ("a", "x")]
            .iter()
            .map(|(r, c)| (r.to_string(), c.to_string()))
            .collect();
        let ct = contingency_table(&pairs);

        assert_eq!(ct.row_labels, vec!["a", "b"]);
        assert_eq!(ct.col_labels, vec!["x", "y"]);
        assert_eq!(ct.counts, vec![vec![2.0, 1.0], vec![1.0, 0.0]]);
    }
}
