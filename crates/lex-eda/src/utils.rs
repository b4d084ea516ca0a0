//! Shared utilities for the analysis engine.
//!
//! Dtype predicates, numeric string parsing, and extraction of typed values
//! out of Polars series. Every extractor treats float `NaN` as missing so the
//! rest of the crate only ever sees `None` for "no value".

use crate::error::{EdaError, Result};
use chrono::{DateTime, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::hash::Hash;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Storage-level category of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtypeCategory {
    /// Integer or floating point numbers
    Numeric,
    /// Date or datetime types
    Datetime,
    /// Boolean type
    Boolean,
    /// String/categorical text type
    String,
    /// Other/unknown types
    Other,
}

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a float type (may carry `NaN`).
#[inline]
pub fn is_float_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// Check if a DataType is a calendar type.
///
/// `Time` (time-of-day without a date) is not a calendar type and is
/// analysed as text.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Check if a DataType is boolean.
#[inline]
pub fn is_boolean_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Boolean)
}

/// Get the category of a DataType.
pub fn get_dtype_category(dtype: &DataType) -> DtypeCategory {
    if is_numeric_dtype(dtype) {
        DtypeCategory::Numeric
    } else if is_datetime_dtype(dtype) {
        DtypeCategory::Datetime
    } else if is_boolean_dtype(dtype) {
        DtypeCategory::Boolean
    } else if matches!(
        dtype,
        DataType::String | DataType::Categorical(_, _) | DataType::Enum(_, _)
    ) {
        DtypeCategory::String
    } else {
        DtypeCategory::Other
    }
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 8] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "#n/a",
];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// ```rust,ignore
/// assert_eq!(clean_numeric_string("$1,234.56"), "1234.56");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles currency symbols, percentages, and thousands separators.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

// =============================================================================
// Series Extraction Utilities
// =============================================================================

/// Look up a column as a materialized series.
pub fn column_series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| EdaError::ColumnNotFound(name.to_string()))
}

/// Per-row presence mask: `true` where the value is non-null and not `NaN`.
pub fn presence_mask(series: &Series) -> Result<Vec<bool>> {
    if is_float_dtype(series.dtype()) {
        return Ok(numeric_values(series)?
            .into_iter()
            .map(|v| v.is_some())
            .collect());
    }
    Ok(series
        .is_not_null()
        .into_iter()
        .map(|v| v.unwrap_or(false))
        .collect())
}

/// Number of missing entries (null or `NaN`).
pub fn missing_count(series: &Series) -> Result<usize> {
    if is_float_dtype(series.dtype()) {
        return Ok(presence_mask(series)?.iter().filter(|p| !**p).count());
    }
    Ok(series.null_count())
}

/// Extract values as `f64`, with `NaN` mapped to `None`.
pub fn numeric_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series.cast(&DataType::Float64)?;
    Ok(casted
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| !x.is_nan()))
        .collect())
}

/// Extract values as strings (booleans become `"true"`/`"false"`).
pub fn string_values(series: &Series) -> Result<Vec<Option<String>>> {
    if is_float_dtype(series.dtype()) {
        // keep NaN out of the category space
        return Ok(numeric_values(series)?
            .into_iter()
            .map(|v| v.map(format_float_label))
            .collect());
    }
    let casted = series.cast(&DataType::String)?;
    Ok(casted
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Extract calendar values from a `Datetime` or `Date` series.
///
/// Timezone-aware columns are read as UTC wall-clock time.
pub fn datetime_values(series: &Series) -> Result<Vec<Option<NaiveDateTime>>> {
    match series.dtype() {
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let physical = series.cast(&DataType::Int64)?;
            Ok(physical
                .i64()?
                .into_iter()
                .map(|v| v.and_then(|raw| timestamp_to_naive(raw, unit)))
                .collect())
        }
        DataType::Date => {
            let physical = series.cast(&DataType::Int32)?;
            Ok(physical
                .i32()?
                .into_iter()
                .map(|v| {
                    v.and_then(|days| {
                        DateTime::from_timestamp(days as i64 * 86_400, 0).map(|dt| dt.naive_utc())
                    })
                })
                .collect())
        }
        other => Err(EdaError::InvalidPair {
            first: series.name().to_string(),
            second: other.to_string(),
            reason: "column is not a datetime column".to_string(),
        }),
    }
}

/// Convert a raw timestamp in `unit` since the Unix epoch.
pub fn timestamp_to_naive(raw: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let per_second: i64 = match unit {
        TimeUnit::Nanoseconds => 1_000_000_000,
        TimeUnit::Microseconds => 1_000_000,
        TimeUnit::Milliseconds => 1_000,
    };
    let secs = raw.div_euclid(per_second);
    let sub = raw.rem_euclid(per_second);
    let nanos = (sub * (1_000_000_000 / per_second)) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

/// Render a float category label the way it reads in a table (`3` not `3.0`).
pub fn format_float_label(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Count distinct values of a hashable sequence.
pub fn count_distinct<T: Hash + Eq>(values: impl IntoIterator<Item = T>) -> usize {
    values.into_iter().collect::<HashSet<T>>().len()
}

/// Count distinct floats, treating `-0.0` and `0.0` as equal.
pub fn count_distinct_f64(values: &[f64]) -> usize {
    count_distinct(
        values
            .iter()
            .map(|v| if *v == 0.0 { 0u64 } else { v.to_bits() }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    // ==================== dtype helpers ====================

    #[test]
    fn test_dtype_categories() {
        assert_eq!(get_dtype_category(&DataType::Int64), DtypeCategory::Numeric);
        assert_eq!(get_dtype_category(&DataType::Float32), DtypeCategory::Numeric);
        assert_eq!(get_dtype_category(&DataType::Date), DtypeCategory::Datetime);
        assert_eq!(
            get_dtype_category(&DataType::Datetime(TimeUnit::Milliseconds, None)),
            DtypeCategory::Datetime
        );
        assert_eq!(get_dtype_category(&DataType::Boolean), DtypeCategory::Boolean);
        assert_eq!(get_dtype_category(&DataType::String), DtypeCategory::String);
        assert_eq!(get_dtype_category(&DataType::Time), DtypeCategory::Other);
    }

    // ==================== string parsing ====================

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("$1,234.56"), Some(1234.56));
        assert_eq!(parse_numeric_string(" 42% "), Some(42.0));
        assert_eq!(parse_numeric_string("abc"), None);
        assert_eq!(parse_numeric_string(""), None);
    }

    #[test]
    fn test_is_error_marker() {
        assert!(is_error_marker("N/A"));
        assert!(is_error_marker("  missing "));
        assert!(!is_error_marker("42"));
    }

    // ==================== extraction ====================

    #[test]
    fn test_numeric_values_maps_nan_to_none() {
        let series = Series::new("x".into(), &[Some(1.0f64), Some(f64::NAN), None, Some(3.0)]);
        let values = numeric_values(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, None, Some(3.0)]);
        assert_eq!(missing_count(&series).unwrap(), 2);
        assert_eq!(presence_mask(&series).unwrap(), vec![true, false, false, true]);
    }

    #[test]
    fn test_string_values_from_ints_and_bools() {
        let ints = Series::new("x".into(), &[Some(1i64), None, Some(3)]);
        assert_eq!(
            string_values(&ints).unwrap(),
            vec![Some("1".to_string()), None, Some("3".to_string())]
        );

        let bools = Series::new("b".into(), &[true, false]);
        assert_eq!(
            string_values(&bools).unwrap(),
            vec![Some("true".to_string()), Some("false".to_string())]
        );
    }

    #[test]
    fn test_string_values_from_floats() {
        let floats = Series::new("x".into(), &[1.0f64, 2.5, f64::NAN]);
        assert_eq!(
            string_values(&floats).unwrap(),
            vec![Some("1".to_string()), Some("2.5".to_string()), None]
        );
    }

    #[test]
    fn test_datetime_values_from_millis() {
        // 2024-03-15 13:45:30 UTC
        let series = Series::new("ts".into(), &[Some(1_710_510_330_000i64), None])
            .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))
            .unwrap();
        let values = datetime_values(&series).unwrap();
        let dt = values[0].unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
        assert_eq!((dt.hour(), dt.minute(), dt.second()), (13, 45, 30));
        assert!(values[1].is_none());
    }

    #[test]
    fn test_datetime_values_from_date() {
        // 19797 days after epoch = 2024-03-15
        let series = Series::new("d".into(), &[19_797i32])
            .cast(&DataType::Date)
            .unwrap();
        let dt = datetime_values(&series).unwrap()[0].unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 15));
    }

    #[test]
    fn test_datetime_values_rejects_text() {
        let series = Series::new("s".into(), &["a"]);
        assert!(datetime_values(&series).is_err());
    }

    #[test]
    fn test_timestamp_before_epoch() {
        let dt = timestamp_to_naive(-1, TimeUnit::Milliseconds).unwrap();
        assert_eq!(dt.year(), 1969);
        assert_eq!(dt.nanosecond(), 999_000_000);
    }

    #[test]
    fn test_count_distinct_f64_zero_signs() {
        assert_eq!(count_distinct_f64(&[0.0, -0.0, 1.0, 1.0]), 2);
    }
}
