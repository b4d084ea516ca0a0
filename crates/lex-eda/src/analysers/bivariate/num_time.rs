use super::{PairStrategy, clean_subset, ensure_rows};
use crate::error::Result;
use crate::profiler::{day_ordinal, infer_series_granularity};
use crate::stats::linear_regression;
use crate::types::{PairSummary, PlotSpec, ResultKind, SeasonalityRow, TimeComponent, TimePoint};
use crate::utils::{column_series, datetime_values, numeric_values};
use chrono::NaiveDateTime;
use polars::prelude::*;
use std::collections::BTreeMap;

/// Trend and seasonality of a numerical column over a datetime column.
#[derive(Debug, Clone)]
pub struct NumTimeAnalyser {
    num: String,
    time: String,
    frame: DataFrame,
    granularity: Vec<TimeComponent>,
}

impl NumTimeAnalyser {
    /// The hue only filters rows: time-series plots are not coloured.
    pub fn new(df: &DataFrame, num: &str, time: &str, hue: Option<&str>) -> Result<Self> {
        let mut columns = vec![num, time];
        columns.extend(hue);
        // granularity describes the whole datetime column, not the cleaned pair
        let granularity = infer_series_granularity(column_series(df, time)?)?;
        Ok(Self {
            num: num.to_string(),
            time: time.to_string(),
            frame: clean_subset(df, &columns)?,
            granularity,
        })
    }

    pub fn granularity(&self) -> &[TimeComponent] {
        &self.granularity
    }

    /// Cleaned (timestamp, value) pairs in row order.
    fn observations(&self) -> Result<Vec<(NaiveDateTime, f64)>> {
        ensure_rows(&self.frame, &self.num, &self.time)?;
        let times = datetime_values(column_series(&self.frame, &self.time)?)?;
        let values = numeric_values(column_series(&self.frame, &self.num)?)?;
        Ok(times
            .into_iter()
            .zip(values)
            .filter_map(|(t, v)| Some((t?, v?)))
            .collect())
    }

    /// Mean value per component value, for every granularity component.
    ///
    /// Rows are ordered by component (finest first), then by component value.
    pub fn seasonality(&self) -> Result<Vec<SeasonalityRow>> {
        let observations = self.observations()?;
        let mut rows = Vec::new();
        for component in &self.granularity {
            let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
            for (time, value) in &observations {
                let entry = sums.entry(component.extract(time)).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
            rows.extend(sums.into_iter().map(|(time, (sum, count))| SeasonalityRow {
                granularity: *component,
                time,
                mean_value: sum / count as f64,
            }));
        }
        Ok(rows)
    }
}

impl PairStrategy for NumTimeAnalyser {
    fn result_kind(&self) -> ResultKind {
        ResultKind::LinearRegression
    }

    fn validate(&self) -> bool {
        true
    }

    /// Regression of the value on the day ordinal, plus the seasonality
    /// breakdown.
    fn summarize(&self) -> Result<PairSummary> {
        let observations = self.observations()?;
        let (days, values): (Vec<f64>, Vec<f64>) = observations
            .iter()
            .map(|(t, v)| (day_ordinal(t), *v))
            .unzip();
        let context = format!("trend of '{}' over '{}'", self.num, self.time);
        Ok(PairSummary::Trend {
            regression: linear_regression(&days, &values, &context)?,
            seasonality: self.seasonality()?,
        })
    }

    fn visualize(&self) -> Result<Option<PlotSpec>> {
        let mut observations = self.observations()?;
        observations.sort_by_key(|(t, _)| *t);
        let points = observations
            .into_iter()
            .map(|(t, value)| TimePoint {
                timestamp: t.format("%Y-%m-%d %H:%M:%S").to_string(),
                value,
            })
            .collect();
        Ok(Some(PlotSpec::TimeSeries {
            time: self.time.clone(),
            value: self.num.clone(),
            points,
            seasonality: self.seasonality()?,
        }))
    }
}
