//! Time granularity inference and calendar binning for datetime columns.

use crate::error::Result;
use crate::types::{TimeComponent, WEEKDAY_LABELS};
use crate::utils::{count_distinct, datetime_values};
use chrono::{Datelike, NaiveDateTime};
use polars::prelude::*;

/// Components along which `values` vary, finest first.
///
/// A component is included when it takes more than one distinct value.
/// Constant (or empty) input yields an empty vector.
pub fn infer_granularity(values: &[NaiveDateTime]) -> Vec<TimeComponent> {
    TimeComponent::ALL
        .into_iter()
        .filter(|component| count_distinct(values.iter().map(|v| component.extract(v))) > 1)
        .collect()
}

/// [`infer_granularity`] over the non-null values of a datetime series.
pub fn infer_series_granularity(series: &Series) -> Result<Vec<TimeComponent>> {
    let values: Vec<NaiveDateTime> = datetime_values(series)?.into_iter().flatten().collect();
    Ok(infer_granularity(&values))
}

/// Proleptic Gregorian day number, 0001-01-01 being day 1. Time of day is
/// ignored.
pub fn day_ordinal(value: &NaiveDateTime) -> f64 {
    value.date().num_days_from_ce() as f64
}

/// A calendar bucket: `order` sorts buckets chronologically, `label` names them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodBin {
    pub order: i64,
    pub label: String,
}

/// Right-closed bins `(lower, edges[0]], (edges[0], edges[1]], ...`.
struct BinScheme {
    lower: i64,
    edges: &'static [i64],
}

const DAY_BINS: BinScheme = BinScheme {
    lower: 0,
    edges: &[7, 14, 21, 28, 31],
};

const HOUR_BINS: BinScheme = BinScheme {
    lower: -1,
    edges: &[3, 6, 9, 12, 15, 18, 21, 24],
};

const MINUTE_BINS: BinScheme = BinScheme {
    lower: -1,
    edges: &[5, 10, 15, 20, 25, 30, 35, 40, 45, 50, 55, 60],
};

impl BinScheme {
    fn bin(&self, value: i64) -> PeriodBin {
        let index = self
            .edges
            .iter()
            .position(|edge| value <= *edge)
            .unwrap_or(self.edges.len() - 1);
        let lower = if index == 0 {
            self.lower
        } else {
            self.edges[index - 1]
        };
        PeriodBin {
            order: index as i64,
            label: format!("{}-{}", lower + 1, self.edges[index]),
        }
    }

    fn labels(&self) -> Vec<String> {
        (0..self.edges.len())
            .map(|i| self.bin(self.edges[i]).label)
            .collect()
    }
}

/// Bucket a component value the way categorical-datetime analysis groups it.
///
/// Day of month, hour, minute and second are binned into ranges; day of week
/// becomes `Mon`..`Sun`; month and year are kept as is.
pub fn period_bin(component: TimeComponent, value: i64) -> PeriodBin {
    match component {
        TimeComponent::Day => DAY_BINS.bin(value),
        TimeComponent::Hour => HOUR_BINS.bin(value),
        TimeComponent::Minute | TimeComponent::Second => MINUTE_BINS.bin(value),
        TimeComponent::DayOfWeek => PeriodBin {
            order: value,
            label: weekday_label(value),
        },
        TimeComponent::Month | TimeComponent::Year => PeriodBin {
            order: value,
            label: value.to_string(),
        },
    }
}

/// Every bin label of a binned component, in order. Empty for unbinned ones.
pub fn bin_labels(component: TimeComponent) -> Vec<String> {
    match component {
        TimeComponent::Day => DAY_BINS.labels(),
        TimeComponent::Hour => HOUR_BINS.labels(),
        TimeComponent::Minute | TimeComponent::Second => MINUTE_BINS.labels(),
        _ => Vec::new(),
    }
}

/// Label of a weekday index, 0 = Monday.
pub fn weekday_label(value: i64) -> String {
    usize::try_from(value)
        .ok()
        .and_then(|i| WEEKDAY_LABELS.get(i))
        .map(|s| s.to_string())
        .unwrap_or_else(|| value.to_string())
}
