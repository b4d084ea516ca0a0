//! Column profiling: the leaf computations every analyser builds on.
//!
//! This module provides:
//! - Semantic type classification ([`classify`])
//! - Time granularity inference and calendar binning
//! - The high-cardinality guard and top-K compression
//! - Descriptive statistics
//! - Dataset-wide overview counts ([`DataProfiler::overview`])

mod cardinality;
mod granularity;
mod statistics;
mod type_inference;

use crate::error::Result;
use crate::types::{DatasetOverview, SemanticType};
use crate::utils::missing_count;
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

pub use cardinality::{
    OTHERS_LABEL, category_counts, compress_categories, compress_series, is_high_cardinality,
    is_high_cardinality_series, top_categories,
};
pub use granularity::{
    PeriodBin, bin_labels, day_ordinal, infer_granularity, infer_series_granularity, period_bin, weekday_label,
};
pub use statistics::{
    DEFAULT_HISTOGRAM_BINS, box_plot_summary, build_histogram, mean, numeric_summary,
    quantile_sorted, sample_std, skewness, sorted_copy,
};
pub use type_inference::classify;

/// Dataset-level profiling entry points.
pub struct DataProfiler;

impl DataProfiler {
    /// Count rows, columns and missing values. `NaN` counts as missing.
    pub fn overview(df: &DataFrame) -> Result<DatasetOverview> {
        let mut missing_by_column = HashMap::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            missing_by_column.insert(series.name().to_string(), missing_count(series)?);
        }
        let total_missing: usize = missing_by_column.values().sum();

        debug!(
            "Overview: {} rows, {} columns, {} missing values",
            df.height(),
            df.width(),
            total_missing
        );

        Ok(DatasetOverview {
            row_count: df.height(),
            column_count: df.width(),
            total_missing,
            missing_by_column,
        })
    }

    /// Classify every column, in column order.
    ///
    /// Columns without any value map to `None` ("type unknown") instead of
    /// failing the whole dataset.
    pub fn classify_columns(
        df: &DataFrame,
        cat_threshold: usize,
    ) -> Result<Vec<(String, Option<SemanticType>)>> {
        let mut classified = Vec::with_capacity(df.width());
        for column in df.get_columns() {
            let series = column.as_materialized_series();
            let semantic = match classify(series, cat_threshold) {
                Ok(semantic) => Some(semantic),
                Err(e) if e.is_type_unknown() => None,
                Err(e) => return Err(e),
            };
            classified.push((series.name().to_string(), semantic));
        }
        Ok(classified)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overview_counts_nulls_and_nan() {
        let df = df! {
            "a" => &[Some(1.0f64), None, Some(f64::NAN), Some(4.0)],
            "b" => &[Some("x"), Some("y"), None, Some("z")],
        }
        .unwrap();

        let overview = DataProfiler::overview(&df).unwrap();
        assert_eq!(overview.row_count, 4);
        assert_eq!(overview.column_count, 2);
        assert_eq!(overview.missing_by_column["a"], 2);
        assert_eq!(overview.missing_by_column["b"], 1);
        assert_eq!(overview.total_missing, 3);
        assert_eq!(overview.missing_ratio("a").unwrap(), 0.5);
    }

    #[test]
    fn test_classify_columns_marks_empty_as_unknown() {
        let df = df! {
            "num" => &[1.0f64, 2.0, 3.0],
            "empty" => &[None::<i64>, None, None],
            "text" => &["a", "b", "c"],
        }
        .unwrap();

        let classified = DataProfiler::classify_columns(&df, 2).unwrap();
        assert_eq!(
            classified,
            vec![
                ("num".to_string(), Some(SemanticType::Numerical)),
                ("empty".to_string(), None),
                ("text".to_string(), Some(SemanticType::Categorical)),
            ]
        );
    }
}
