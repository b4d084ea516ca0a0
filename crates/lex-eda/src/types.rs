use crate::error::{EdaError, Result};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Semantic Types
// ============================================================================

/// Inferred analytical role of a column, independent of its storage dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Numerical,
    Categorical,
    Datetime,
    /// Routed as categorical.
    Boolean,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Boolean => "boolean",
        }
    }

    /// True for categorical and boolean columns.
    pub fn is_categorical(&self) -> bool {
        matches!(self, Self::Categorical | Self::Boolean)
    }

    /// The type used for strategy selection: boolean collapses to categorical.
    pub fn routing_type(&self) -> SemanticType {
        match self {
            Self::Boolean => Self::Categorical,
            other => *other,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Time Components
// ============================================================================

/// A calendar component of a datetime value.
///
/// Declaration order is finest to coarsest and is the order granularity is
/// reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeComponent {
    Second,
    Minute,
    Hour,
    #[serde(rename = "dayofweek")]
    DayOfWeek,
    Day,
    Month,
    Year,
}

/// Three-letter weekday labels, Monday first.
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

impl TimeComponent {
    /// All components, finest first.
    pub const ALL: [TimeComponent; 7] = [
        Self::Second,
        Self::Minute,
        Self::Hour,
        Self::DayOfWeek,
        Self::Day,
        Self::Month,
        Self::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Second => "second",
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::DayOfWeek => "dayofweek",
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Axis label for charts.
    pub fn axis_label(&self) -> &'static str {
        match self {
            Self::Second => "Second",
            Self::Minute => "Minute",
            Self::Hour => "Hour",
            Self::DayOfWeek => "Day of Week",
            Self::Day => "Day",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }

    /// Extract the component's integer value. Day of week is 0 = Monday.
    pub fn extract(&self, value: &NaiveDateTime) -> i64 {
        match self {
            Self::Second => value.second() as i64,
            Self::Minute => value.minute() as i64,
            Self::Hour => value.hour() as i64,
            Self::DayOfWeek => value.weekday().num_days_from_monday() as i64,
            Self::Day => value.day() as i64,
            Self::Month => value.month() as i64,
            Self::Year => value.year() as i64,
        }
    }
}

impl fmt::Display for TimeComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeComponent {
    type Err = EdaError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        TimeComponent::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| EdaError::unsupported("time period", s))
    }
}

// ============================================================================
// Dataset Overview
// ============================================================================

/// Dataset-wide counts, computed once per dataset version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    pub row_count: usize,
    pub column_count: usize,
    pub total_missing: usize,
    pub missing_by_column: HashMap<String, usize>,
}

impl DatasetOverview {
    /// Compute the overview of `df`; see [`DataProfiler::overview`](crate::profiler::DataProfiler::overview).
    pub fn from_dataframe(df: &polars::prelude::DataFrame) -> Result<Self> {
        crate::profiler::DataProfiler::overview(df)
    }

    /// Fraction of rows missing in `column`.
    pub fn missing_ratio(&self, column: &str) -> Result<f64> {
        let missing = self
            .missing_by_column
            .get(column)
            .ok_or_else(|| EdaError::ColumnNotFound(column.to_string()))?;
        if self.row_count == 0 {
            return Err(EdaError::EmptyInput("an empty dataset".to_string()));
        }
        Ok(*missing as f64 / self.row_count as f64)
    }
}

// ============================================================================
// Univariate Results
// ============================================================================

/// Descriptive statistics of a numerical column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub range: f64,
    /// Adjusted Fisher-Pearson skewness; `None` with fewer than three values.
    pub skewness: Option<f64>,
}

/// Output of a univariate `analyse()` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnivariateResult {
    pub column: String,
    pub dtype: SemanticType,
    pub missing_ratio: f64,
    pub summary: Option<NumericSummary>,
    /// `None` means no plot applies.
    pub plot: Option<PlotSpec>,
}

// ============================================================================
// Bivariate Results
// ============================================================================

/// What a bivariate result holds: the name of the computed summary, or a
/// status explaining why nothing was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    LinearRegression,
    GroupBy,
    ChiSquare,
    /// Cardinality guard tripped; analysis skipped.
    HighCardinality,
}

impl ResultKind {
    /// Display name for the summary table.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::LinearRegression => "Linear Regression Analysis",
            Self::GroupBy => "Groupby Analysis",
            Self::ChiSquare => "Chi-square test",
            Self::HighCardinality => "high-cardinality",
        }
    }

    pub fn is_status(&self) -> bool {
        matches!(self, Self::HighCardinality)
    }
}

/// Pearson correlation plus ordinary least squares fit of y on x.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSummary {
    pub correlation: f64,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Two-sided p-value for a zero slope.
    pub p_value: f64,
    /// Standard error of the slope.
    pub std_err: f64,
    pub n: usize,
}

/// Aggregates of the numeric column for one (compressed) category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub category: String,
    pub count: usize,
    pub mean: f64,
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

/// Cross-tabulated counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyTable {
    pub row_labels: Vec<String>,
    pub column_labels: Vec<String>,
    /// `counts[row][column]`
    pub counts: Vec<Vec<usize>>,
}

impl ContingencyTable {
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn row_totals(&self) -> Vec<usize> {
        self.counts.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<usize> {
        let mut totals = vec![0usize; self.column_labels.len()];
        for row in &self.counts {
            for (total, count) in totals.iter_mut().zip(row) {
                *total += count;
            }
        }
        totals
    }

    /// Each row divided by its total (stacked-bar shares).
    pub fn row_shares(&self) -> Vec<Vec<f64>> {
        self.counts
            .iter()
            .map(|row| {
                let total: usize = row.iter().sum();
                row.iter()
                    .map(|c| {
                        if total == 0 {
                            0.0
                        } else {
                            *c as f64 / total as f64
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// The table with rows and columns swapped.
    pub fn transposed(&self) -> ContingencyTable {
        let counts = (0..self.column_labels.len())
            .map(|j| self.counts.iter().map(|row| row[j]).collect())
            .collect();
        ContingencyTable {
            row_labels: self.column_labels.clone(),
            column_labels: self.row_labels.clone(),
            counts,
        }
    }
}

/// Pearson chi-square test of independence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChiSquareTest {
    pub statistic: f64,
    pub p_value: f64,
    pub dof: usize,
}

/// Mean of the numeric column for one value of a time component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityRow {
    pub granularity: TimeComponent,
    pub time: i64,
    pub mean_value: f64,
}

/// Statistics computed by a bivariate strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PairSummary {
    Regression(RegressionSummary),
    Trend {
        regression: RegressionSummary,
        seasonality: Vec<SeasonalityRow>,
    },
    Grouped {
        groups: Vec<GroupStats>,
    },
    Contingency {
        table: ContingencyTable,
        test: ChiSquareTest,
    },
}

/// A single bivariate result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub kind: ResultKind,
    pub summary: Option<PairSummary>,
    pub plot: Option<PlotSpec>,
}

impl AnalysisResult {
    /// The status returned when the cardinality guard trips.
    pub fn high_cardinality() -> Self {
        Self {
            kind: ResultKind::HighCardinality,
            summary: None,
            plot: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.kind.is_status()
    }
}

/// Result for one granularity component of a categorical-datetime pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodResult {
    pub period: TimeComponent,
    pub result: AnalysisResult,
}

/// Output of a bivariate `analyse()` call.
///
/// Categorical-datetime pairs have no single summary without fixing a period,
/// so they produce one result per granularity component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "results", rename_all = "snake_case")]
pub enum PairAnalysis {
    Single(AnalysisResult),
    PerPeriod(Vec<PeriodResult>),
}

impl PairAnalysis {
    pub fn as_single(&self) -> Option<&AnalysisResult> {
        match self {
            Self::Single(result) => Some(result),
            Self::PerPeriod(_) => None,
        }
    }

    pub fn as_per_period(&self) -> Option<&[PeriodResult]> {
        match self {
            Self::Single(_) => None,
            Self::PerPeriod(results) => Some(results),
        }
    }
}

// ============================================================================
// Plot Payloads
// ============================================================================

/// Renderer-facing plot data. The engine never draws anything itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlotSpec {
    /// Histogram and box plot of a numerical column.
    Distribution {
        column: String,
        histogram: Vec<HistogramBin>,
        box_plot: BoxPlotSummary,
    },
    /// Bar/pie data of a compressed categorical column.
    CategoryCounts {
        column: String,
        counts: Vec<CategoryCount>,
    },
    /// Scatter of two numerical columns with the fitted regression line.
    Scatter {
        x: String,
        y: String,
        hue: Option<String>,
        points: Vec<ScatterPoint>,
        fit: Option<FitLine>,
    },
    /// Box/strip data of a numerical column split by category.
    GroupedPoints {
        category: String,
        value: String,
        hue: Option<String>,
        groups: Vec<PointGroup>,
    },
    /// Heatmap counts and stacked-bar shares.
    Contingency {
        rows: String,
        columns: String,
        table: ContingencyTable,
        row_shares: Vec<Vec<f64>>,
    },
    /// Line of a numerical column over time plus seasonality boxes.
    TimeSeries {
        time: String,
        value: String,
        points: Vec<TimePoint>,
        seasonality: Vec<SeasonalityRow>,
    },
    /// Counts of a datetime column per calendar component value.
    PeriodCounts {
        column: String,
        period: TimeComponent,
        x_label: String,
        counts: Vec<CategoryCount>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPlotSummary {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub value: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub hue: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitLine {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGroup {
    pub category: String,
    pub values: Vec<f64>,
    /// Hue label per value, aligned with `values`, when a hue column is set.
    pub hues: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_semantic_type_routing() {
        assert_eq!(SemanticType::Boolean.routing_type(), SemanticType::Categorical);
        assert_eq!(SemanticType::Numerical.routing_type(), SemanticType::Numerical);
        assert!(SemanticType::Boolean.is_categorical());
        assert!(!SemanticType::Datetime.is_categorical());
    }

    #[test]
    fn test_time_component_order_is_finest_first() {
        let mut sorted = TimeComponent::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, TimeComponent::ALL.to_vec());
        assert_eq!(TimeComponent::ALL[0], TimeComponent::Second);
        assert_eq!(TimeComponent::ALL[6], TimeComponent::Year);
    }

    #[test]
    fn test_time_component_from_str() {
        assert_eq!("hour".parse::<TimeComponent>().unwrap(), TimeComponent::Hour);
        assert_eq!(
            " DayOfWeek ".parse::<TimeComponent>().unwrap(),
            TimeComponent::DayOfWeek
        );
        let err = "houe".parse::<TimeComponent>().unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_METHOD");
    }

    #[test]
    fn test_time_component_extract() {
        // 2024-03-17 is a Sunday
        let dt = NaiveDate::from_ymd_opt(2024, 3, 17)
            .unwrap()
            .and_hms_opt(8, 30, 15)
            .unwrap();
        assert_eq!(TimeComponent::DayOfWeek.extract(&dt), 6);
        assert_eq!(TimeComponent::Day.extract(&dt), 17);
        assert_eq!(TimeComponent::Hour.extract(&dt), 8);
        assert_eq!(TimeComponent::Second.extract(&dt), 15);
        assert_eq!(TimeComponent::Year.extract(&dt), 2024);
    }

    #[test]
    fn test_missing_ratio() {
        let overview = DatasetOverview {
            row_count: 4,
            column_count: 1,
            total_missing: 1,
            missing_by_column: HashMap::from([("a".to_string(), 1)]),
        };
        assert_eq!(overview.missing_ratio("a").unwrap(), 0.25);
        assert!(matches!(
            overview.missing_ratio("b"),
            Err(EdaError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_missing_ratio_empty_dataset() {
        let overview = DatasetOverview {
            row_count: 0,
            column_count: 1,
            total_missing: 0,
            missing_by_column: HashMap::from([("a".to_string(), 0)]),
        };
        assert!(matches!(
            overview.missing_ratio("a"),
            Err(EdaError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_contingency_helpers() {
        let table = ContingencyTable {
            row_labels: vec!["a".into(), "b".into()],
            column_labels: vec!["x".into(), "y".into(), "z".into()],
            counts: vec![vec![1, 2, 3], vec![4, 0, 0]],
        };
        assert_eq!(table.total(), 10);
        assert_eq!(table.row_totals(), vec![6, 4]);
        assert_eq!(table.column_totals(), vec![5, 2, 3]);
        assert_eq!(table.row_shares()[1], vec![1.0, 0.0, 0.0]);

        let t = table.transposed();
        assert_eq!(t.counts, vec![vec![1, 4], vec![2, 0], vec![3, 0]]);
        assert_eq!(t.row_labels, table.column_labels);
    }

    #[test]
    fn test_pair_analysis_shapes() {
        let single = PairAnalysis::Single(AnalysisResult::high_cardinality());
        assert!(single.as_single().unwrap().is_skipped());
        assert!(single.as_per_period().is_none());

        let multi = PairAnalysis::PerPeriod(vec![]);
        assert!(multi.as_single().is_none());
        assert_eq!(multi.as_per_period().unwrap().len(), 0);
    }
}
