//! Contingency tables and the chi-square test of independence.

use crate::error::{EdaError, Result};
use crate::types::{ChiSquareTest, ContingencyTable};
use anofox_statistics::categorical::chisq_test;
use std::collections::{BTreeSet, HashMap};

/// Distinct labels in lexicographic order.
pub fn sorted_labels<'a>(values: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    values
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// Cross-tabulate paired labels.
///
/// `row_labels` and `column_labels` fix the output order and must cover every
/// observed label.
pub fn build_contingency(
    rows: &[String],
    columns: &[String],
    row_labels: Vec<String>,
    column_labels: Vec<String>,
) -> Result<ContingencyTable> {
    let row_index: HashMap<&str, usize> = row_labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();
    let column_index: HashMap<&str, usize> = column_labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mut counts = vec![vec![0usize; column_labels.len()]; row_labels.len()];
    for (row, column) in rows.iter().zip(columns) {
        let (Some(&i), Some(&j)) = (
            row_index.get(row.as_str()),
            column_index.get(column.as_str()),
        ) else {
            return Err(EdaError::Internal(format!(
                "label pair ('{}', '{}') missing from contingency axes",
                row, column
            )));
        };
        counts[i][j] += 1;
    }

    Ok(ContingencyTable {
        row_labels,
        column_labels,
        counts,
    })
}

/// Pearson chi-square test of independence.
///
/// Expected frequencies come from the margins. With one degree of freedom
/// Yates' continuity correction is applied. A table with a single row or
/// column has zero degrees of freedom: statistic 0, p-value 1.
pub fn chi_square(table: &ContingencyTable) -> Result<ChiSquareTest> {
    if table.total() == 0 {
        return Err(EdaError::EmptyInput("contingency table".to_string()));
    }

    let n_rows = table.row_labels.len();
    let n_cols = table.column_labels.len();
    let dof = n_rows.saturating_sub(1) * n_cols.saturating_sub(1);
    if dof == 0 {
        return Ok(ChiSquareTest {
            statistic: 0.0,
            p_value: 1.0,
            dof,
        });
    }

    if table.row_totals().contains(&0) || table.column_totals().contains(&0) {
        return Err(EdaError::insufficient(
            "chi-square test",
            "contingency table",
            "a row or column has no observations",
        ));
    }

    let result = chisq_test(&table.counts, dof == 1)
        .map_err(|e| EdaError::Internal(format!("chi-square test: {}", e)))?;

    Ok(ChiSquareTest {
        statistic: result.statistic,
        p_value: result.p_value,
        dof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn table(counts: Vec<Vec<usize>>) -> ContingencyTable {
        ContingencyTable {
            row_labels: (0..counts.len()).map(|i| format!("r{}", i)).collect(),
            column_labels: (0..counts[0].len()).map(|j| format!("c{}", j)).collect(),
            counts,
        }
    }

    // ==================== build_contingency tests ====================

    #[test]
    fn test_build_contingency() {
        let rows = labels(&["b", "a", "a", "b", "a"]);
        let cols = labels(&["x", "y", "x", "x", "x"]);
        let table = build_contingency(&rows, &cols, sorted_labels(&rows), sorted_labels(&cols))
            .unwrap();
        assert_eq!(table.row_labels, labels(&["a", "b"]));
        assert_eq!(table.column_labels, labels(&["x", "y"]));
        assert_eq!(table.counts, vec![vec![2, 1], vec![2, 0]]);
    }

    #[test]
    fn test_build_contingency_unknown_label() {
        let rows = labels(&["a"]);
        let cols = labels(&["x"]);
        assert!(build_contingency(&rows, &cols, labels(&["b"]), labels(&["x"])).is_err());
    }

    // ==================== chi_square tests ====================

    #[test]
    fn test_chi_square_with_yates_correction() {
        let result = chi_square(&table(vec![vec![10, 20], vec![30, 40]])).unwrap();
        assert_eq!(result.dof, 1);
        assert!((result.statistic - 0.446_428_571_428_571_4).abs() < 1e-9);
        assert!((result.p_value - 0.504_035_866_452_504_8).abs() < 1e-6);
    }

    #[test]
    fn test_chi_square_without_correction() {
        let result = chi_square(&table(vec![vec![10, 20, 30], vec![20, 20, 10]])).unwrap();
        assert_eq!(result.dof, 2);
        assert!((result.statistic - 12.527_777_777_777_78).abs() < 1e-9);
        assert!((result.p_value - 0.001_903_827_607_695_494).abs() < 1e-8);
    }

    #[test]
    fn test_chi_square_is_transpose_invariant() {
        let t = table(vec![vec![5, 9, 2], vec![7, 1, 6], vec![3, 3, 8]]);
        let a = chi_square(&t).unwrap();
        let b = chi_square(&t.transposed()).unwrap();
        assert!((a.statistic - b.statistic).abs() < 1e-9);
        assert!((a.p_value - b.p_value).abs() < 1e-12);
        assert_eq!(a.dof, b.dof);
    }

    #[test]
    fn test_chi_square_single_row() {
        let result = chi_square(&table(vec![vec![3, 4, 5]])).unwrap();
        assert_eq!(result.dof, 0);
        assert_eq!(result.statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
    }

    #[test]
    fn test_chi_square_rejects_empty_margin() {
        let result = chi_square(&table(vec![vec![4, 0], vec![6, 0]]));
        assert!(matches!(result, Err(EdaError::InsufficientData { .. })));
    }

    #[test]
    fn test_chi_square_empty_table() {
        let empty = ContingencyTable {
            row_labels: vec![],
            column_labels: vec![],
            counts: vec![],
        };
        assert!(matches!(chi_square(&empty), Err(EdaError::EmptyInput(_))));
    }
}
