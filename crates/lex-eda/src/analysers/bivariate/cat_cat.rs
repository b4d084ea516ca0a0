use super::{PairStrategy, as_options, clean_subset, ensure_rows, labels};
use crate::config::EdaConfig;
use crate::error::Result;
use crate::profiler::{compress_categories, is_high_cardinality};
use crate::stats::{build_contingency, chi_square, sorted_labels};
use crate::types::{ContingencyTable, PairSummary, PlotSpec, ResultKind};
use polars::prelude::*;
use tracing::debug;

/// Contingency table and chi-square test of two categorical columns.
#[derive(Debug, Clone)]
pub struct CatCatAnalyser {
    first: String,
    second: String,
    frame: DataFrame,
    top_k: usize,
    high_cardinality_threshold: f64,
}

impl CatCatAnalyser {
    pub fn new(
        df: &DataFrame,
        first: &str,
        second: &str,
        hue: Option<&str>,
        config: &EdaConfig,
    ) -> Result<Self> {
        let mut columns = vec![first, second];
        columns.extend(hue);
        Ok(Self {
            first: first.to_string(),
            second: second.to_string(),
            frame: clean_subset(df, &columns)?,
            top_k: config.top_k,
            high_cardinality_threshold: config.high_cardinality_threshold,
        })
    }

    fn compressed(&self, column: &str) -> Result<Vec<String>> {
        Ok(
            compress_categories(&as_options(&labels(&self.frame, column)?), self.top_k)
                .into_iter()
                .flatten()
                .collect(),
        )
    }

    /// Top-K by top-K cross-tabulation, rows from the first column. Labels are
    /// sorted and only observed ones appear.
    pub fn contingency_table(&self) -> Result<ContingencyTable> {
        ensure_rows(&self.frame, &self.first, &self.second)?;
        let rows = self.compressed(&self.first)?;
        let columns = self.compressed(&self.second)?;
        build_contingency(&rows, &columns, sorted_labels(&rows), sorted_labels(&columns))
    }

    fn is_high_cardinality(&self, column: &str) -> bool {
        labels(&self.frame, column)
            .map(|values| is_high_cardinality(&as_options(&values), self.high_cardinality_threshold))
            .unwrap_or(true)
    }
}

impl PairStrategy for CatCatAnalyser {
    fn result_kind(&self) -> ResultKind {
        ResultKind::ChiSquare
    }

    fn validate(&self) -> bool {
        for column in [&self.first, &self.second] {
            if self.is_high_cardinality(column) {
                debug!("'{}' is high-cardinality, skipping chi-square", column);
                return false;
            }
        }
        true
    }

    fn summarize(&self) -> Result<PairSummary> {
        let table = self.contingency_table()?;
        let test = chi_square(&table)?;
        Ok(PairSummary::Contingency { table, test })
    }

    fn visualize(&self) -> Result<Option<PlotSpec>> {
        let table = self.contingency_table()?;
        Ok(Some(PlotSpec::Contingency {
            rows: self.first.clone(),
            columns: self.second.clone(),
            row_shares: table.row_shares(),
            table,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EdaError;
    use pretty_assertions::assert_eq;

    fn frame() -> DataFrame {
        df! {
            "sex" => &["m", "f", "m", "f", "m", "f", "m", "m", "f", "f"],
            "smoker" => &["y", "n", "n", "n", "y", "n", "y", "n", "y", "n"],
        }
        .unwrap()
    }

    #[test]
    fn test_contingency_table_order() {
        let analyser =
            CatCatAnalyser::new(&frame(), "sex", "smoker", None, &EdaConfig::default()).unwrap();
        let table = analyser.contingency_table().unwrap();
        assert_eq!(table.row_labels, vec!["f".to_string(), "m".to_string()]);
        assert_eq!(table.column_labels, vec!["n".to_string(), "y".to_string()]);
        assert_eq!(table.counts, vec![vec![4, 1], vec![2, 3]]);
    }

    #[test]
    fn test_chi_square_symmetric_under_swap() {
        let config = EdaConfig::default();
        let ab = CatCatAnalyser::new(&frame(), "sex", "smoker", None, &config).unwrap();
        let ba = CatCatAnalyser::new(&frame(), "smoker", "sex", None, &config).unwrap();
        let (Ok(PairSummary::Contingency { test: t1, .. }), Ok(PairSummary::Contingency { test: t2, .. })) =
            (ab.summarize(), ba.summarize())
        else {
            panic!("expected contingency summaries");
        };
        assert!((t1.statistic - t2.statistic).abs() < 1e-12);
        assert!((t1.p_value - t2.p_value).abs() < 1e-12);
        assert_eq!(t1.dof, t2.dof);
    }

    #[test]
    fn test_singleton_categories_are_guarded() {
        let df = df! {
            "a" => &["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"],
            "b" => &["x", "y", "x", "y", "x", "y", "x", "y"],
        }
        .unwrap();
        let result = CatCatAnalyser::new(&df, "a", "b", None, &EdaConfig::default())
            .unwrap()
            .analyse()
            .unwrap();
        assert_eq!(result.kind, ResultKind::HighCardinality);
        assert!(result.is_skipped());
    }

    #[test]
    fn test_stacked_shares_sum_to_one() {
        let plot = CatCatAnalyser::new(&frame(), "sex", "smoker", None, &EdaConfig::default())
            .unwrap()
            .visualize()
            .unwrap();
        let Some(PlotSpec::Contingency { row_shares, .. }) = plot else {
            panic!("expected contingency plot");
        };
        for row in row_shares {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_empty_after_cleaning() {
        let df = df! {
            "a" => &[Some("x"), None],
            "b" => &[None, Some("y")],
        }
        .unwrap();
        let analyser = CatCatAnalyser::new(&df, "a", "b", None, &EdaConfig::default()).unwrap();
        assert!(matches!(analyser.analyse(), Err(EdaError::EmptyInput(_))));
    }
}
