//! Single-column analysers.
//!
//! Each analyser cleans its column once at construction. `analyse()` combines
//! the cached pieces with dataset-wide missing counts from a
//! [`DatasetOverview`] and returns a fresh [`UnivariateResult`].

use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::profiler::{
    DEFAULT_HISTOGRAM_BINS, box_plot_summary, build_histogram, category_counts, classify,
    compress_categories, infer_granularity, is_high_cardinality, numeric_summary, sorted_copy,
    weekday_label,
};
use crate::types::{
    CategoryCount, DatasetOverview, NumericSummary, PlotSpec, SemanticType, TimeComponent,
    UnivariateResult,
};
use crate::utils::{column_series, datetime_values, numeric_values, string_values};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Capabilities shared by every single-column analyser.
pub trait ColumnStrategy {
    fn column(&self) -> &str;

    /// Semantic type reported in the result.
    fn dtype(&self) -> SemanticType;

    /// Whether the column is fit for plotting.
    fn validate(&self) -> bool;

    fn summarize(&self) -> Option<NumericSummary>;

    fn visualize(&self) -> Option<PlotSpec>;

    /// Combine summary, plot and missing ratio. Invalid columns get no plot.
    fn analyse(&self, overview: &DatasetOverview) -> Result<UnivariateResult> {
        let plot = if self.validate() {
            self.visualize()
        } else {
            debug!("Column '{}' failed validation, skipping plot", self.column());
            None
        };
        Ok(UnivariateResult {
            column: self.column().to_string(),
            dtype: self.dtype(),
            missing_ratio: overview.missing_ratio(self.column())?,
            summary: self.summarize(),
            plot,
        })
    }
}

// ============================================================================
// Numerical
// ============================================================================

/// Descriptive statistics and distribution plot of a numerical column.
#[derive(Debug, Clone)]
pub struct NumericalAnalyser {
    column: String,
    sorted: Vec<f64>,
    summary: NumericSummary,
}

impl NumericalAnalyser {
    pub fn new(df: &DataFrame, column: &str) -> Result<Self> {
        let series = column_series(df, column)?;
        let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
        if values.is_empty() {
            return Err(EdaError::EmptyColumn(column.to_string()));
        }
        let summary = numeric_summary(&values, column)?;
        Ok(Self {
            column: column.to_string(),
            sorted: sorted_copy(&values),
            summary,
        })
    }
}

impl ColumnStrategy for NumericalAnalyser {
    fn column(&self) -> &str {
        &self.column
    }

    fn dtype(&self) -> SemanticType {
        SemanticType::Numerical
    }

    fn validate(&self) -> bool {
        true
    }

    fn summarize(&self) -> Option<NumericSummary> {
        Some(self.summary.clone())
    }

    fn visualize(&self) -> Option<PlotSpec> {
        Some(PlotSpec::Distribution {
            column: self.column.clone(),
            histogram: build_histogram(&self.sorted, DEFAULT_HISTOGRAM_BINS),
            box_plot: box_plot_summary(&self.sorted),
        })
    }
}

// ============================================================================
// Categorical
// ============================================================================

/// Frequency table of a categorical (or boolean) column.
#[derive(Debug, Clone)]
pub struct CategoricalAnalyser {
    column: String,
    values: Vec<Option<String>>,
    valid: bool,
    top_k: usize,
}

impl CategoricalAnalyser {
    pub fn new(df: &DataFrame, column: &str, config: &EdaConfig) -> Result<Self> {
        let series = column_series(df, column)?;
        let values: Vec<Option<String>> = string_values(series)?
            .into_iter()
            .filter(Option::is_some)
            .collect();
        if values.is_empty() {
            return Err(EdaError::EmptyColumn(column.to_string()));
        }
        let valid = !is_high_cardinality(&values, config.high_cardinality_threshold);
        if !valid {
            debug!("Column '{}' is high-cardinality", column);
        }
        Ok(Self {
            column: column.to_string(),
            values,
            valid,
            top_k: config.top_k,
        })
    }

    /// Compressed frequency table, most frequent first.
    pub fn frequencies(&self) -> Vec<CategoryCount> {
        category_counts(&compress_categories(&self.values, self.top_k))
    }
}

impl ColumnStrategy for CategoricalAnalyser {
    fn column(&self) -> &str {
        &self.column
    }

    fn dtype(&self) -> SemanticType {
        SemanticType::Categorical
    }

    fn validate(&self) -> bool {
        self.valid
    }

    fn summarize(&self) -> Option<NumericSummary> {
        None
    }

    fn visualize(&self) -> Option<PlotSpec> {
        Some(PlotSpec::CategoryCounts {
            column: self.column.clone(),
            counts: self.frequencies(),
        })
    }
}

// ============================================================================
// Datetime
// ============================================================================

/// Granularity and per-period counts of a datetime column.
#[derive(Debug, Clone)]
pub struct DatetimeAnalyser {
    column: String,
    values: Vec<NaiveDateTime>,
    granularity: Vec<TimeComponent>,
}

impl DatetimeAnalyser {
    pub fn new(df: &DataFrame, column: &str) -> Result<Self> {
        let series = column_series(df, column)?;
        let values: Vec<NaiveDateTime> = datetime_values(series)?.into_iter().flatten().collect();
        if values.is_empty() {
            return Err(EdaError::EmptyColumn(column.to_string()));
        }
        let granularity = infer_granularity(&values);
        Ok(Self {
            column: column.to_string(),
            values,
            granularity,
        })
    }

    /// Components along which the column varies, finest first.
    pub fn granularity(&self) -> &[TimeComponent] {
        &self.granularity
    }

    /// Counts per observed component value, in ascending component order.
    /// Weekdays are labelled `Mon`..`Sun`.
    pub fn period_counts(&self, period: TimeComponent) -> Vec<CategoryCount> {
        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for value in &self.values {
            *counts.entry(period.extract(value)).or_default() += 1;
        }
        counts
            .into_iter()
            .map(|(value, count)| CategoryCount {
                value: match period {
                    TimeComponent::DayOfWeek => weekday_label(value),
                    _ => value.to_string(),
                },
                count,
            })
            .collect()
    }

    /// Per-period count plot, selected by name (`"year"`, `"dayofweek"`, ...).
    pub fn plot_by_period(&self, period: &str) -> Result<PlotSpec> {
        let period: TimeComponent = period.parse()?;
        Ok(PlotSpec::PeriodCounts {
            column: self.column.clone(),
            period,
            x_label: period.axis_label().to_string(),
            counts: self.period_counts(period),
        })
    }
}

impl ColumnStrategy for DatetimeAnalyser {
    fn column(&self) -> &str {
        &self.column
    }

    fn dtype(&self) -> SemanticType {
        SemanticType::Datetime
    }

    fn validate(&self) -> bool {
        true
    }

    fn summarize(&self) -> Option<NumericSummary> {
        None
    }

    /// No single plot applies; use [`DatetimeAnalyser::plot_by_period`].
    fn visualize(&self) -> Option<PlotSpec> {
        None
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// A single-column analyser, selected by the column's semantic type.
#[derive(Debug, Clone)]
pub enum ColumnAnalyser {
    Numerical(NumericalAnalyser),
    Categorical(CategoricalAnalyser),
    Datetime(DatetimeAnalyser),
}

impl ColumnAnalyser {
    /// Classify `column` and build the matching analyser.
    pub fn build(df: &DataFrame, column: &str, config: &EdaConfig) -> Result<Self> {
        let semantic = classify(column_series(df, column)?, config.cat_threshold)?;
        debug!("Column '{}' classified as {}", column, semantic);

        let analyser = match semantic.routing_type() {
            SemanticType::Numerical => Self::Numerical(NumericalAnalyser::new(df, column)?),
            SemanticType::Datetime => Self::Datetime(DatetimeAnalyser::new(df, column)?),
            _ => Self::Categorical(CategoricalAnalyser::new(df, column, config)?),
        };
        Ok(analyser)
    }

    pub fn strategy(&self) -> &dyn ColumnStrategy {
        match self {
            Self::Numerical(a) => a,
            Self::Categorical(a) => a,
            Self::Datetime(a) => a,
        }
    }

    pub fn analyse(&self, overview: &DatasetOverview) -> Result<UnivariateResult> {
        self.strategy().analyse(overview)
    }

    pub fn dtype(&self) -> SemanticType {
        self.strategy().dtype()
    }

    pub fn as_datetime(&self) -> Option<&DatetimeAnalyser> {
        match self {
            Self::Datetime(a) => Some(a),
            _ => None,
        }
    }
}
