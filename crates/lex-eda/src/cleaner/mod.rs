//! Best-effort type coercion for text columns.
//!
//! CSV ingestion leaves numbers, dates and flags as text when a single cell
//! is malformed. Before classification, each text column is tried against
//! boolean, numeric and date parsers:
//! - when every cell parses, the column is converted
//! - when most cells parse but some do not, the column is kept as text and
//!   the failure is recorded with its reason
//! - otherwise the column is plain text and left alone
//!
//! Missing markers (`""`, `n/a`, `null`, ...) become nulls on conversion.

mod converters;

use crate::error::Result;
use crate::utils::is_error_marker;
use converters::{Cell, looks_like_date, parse_boolean_cell, parse_datetime_cell, parse_numeric_cell};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Share of non-missing cells that must parse before a conversion is attempted.
pub const DETECTION_RATIO: f64 = 0.7;

/// Type a text column was coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionTarget {
    Boolean,
    Numeric,
    Datetime,
}

impl fmt::Display for CoercionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
            Self::Datetime => "datetime",
        };
        f.write_str(name)
    }
}

/// Why a column that looked convertible was kept as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoercionFailure {
    pub column: String,
    pub target: CoercionTarget,
    pub invalid_count: usize,
    pub first_invalid: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedColumn {
    pub column: String,
    pub target: CoercionTarget,
}

/// What [`coerce_dataframe`] did to each column it touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoercionReport {
    pub converted: Vec<ConvertedColumn>,
    pub failed: Vec<CoercionFailure>,
}

impl CoercionReport {
    pub fn failure(&self, column: &str) -> Option<&CoercionFailure> {
        self.failed.iter().find(|f| f.column == column)
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Outcome of coercing a single column.
#[derive(Debug, Clone)]
pub enum CoercionOutcome {
    Converted {
        series: Series,
        target: CoercionTarget,
    },
    Unchanged,
    Failed(CoercionFailure),
}

enum Attempt<T> {
    NotApplicable,
    Parsed(Vec<Option<T>>),
    Failed(CoercionFailure),
}

/// Run `parse` over every cell and decide whether the column is of `target`.
fn attempt<T>(
    name: &str,
    cells: &[Option<&str>],
    target: CoercionTarget,
    parse: impl Fn(&str) -> Cell<T>,
) -> Attempt<T> {
    let parsed: Vec<Option<Cell<T>>> = cells.iter().map(|c| c.map(&parse)).collect();

    let mut valid = 0usize;
    let mut invalid = 0usize;
    let mut first_invalid = None;
    for (cell, raw) in parsed.iter().zip(cells) {
        match cell {
            Some(Cell::Value(_)) => valid += 1,
            Some(Cell::Invalid) => {
                invalid += 1;
                if first_invalid.is_none() {
                    first_invalid = *raw;
                }
            }
            _ => {}
        }
    }

    let checked = valid + invalid;
    if checked == 0 || (valid as f64 / checked as f64) < DETECTION_RATIO {
        return Attempt::NotApplicable;
    }

    if invalid > 0 {
        let first_invalid = first_invalid.unwrap_or_default().to_string();
        return Attempt::Failed(CoercionFailure {
            column: name.to_string(),
            target,
            invalid_count: invalid,
            reason: format!(
                "{} of {} values are not {} (first: '{}')",
                invalid, checked, target, first_invalid
            ),
            first_invalid,
        });
    }

    Attempt::Parsed(
        parsed
            .into_iter()
            .map(|c| c.and_then(Cell::into_option))
            .collect(),
    )
}

/// Try to convert a text column to a boolean, numeric or datetime column.
///
/// Non-text columns are returned [`CoercionOutcome::Unchanged`].
pub fn coerce_column(series: &Series) -> Result<CoercionOutcome> {
    if series.dtype() != &DataType::String {
        return Ok(CoercionOutcome::Unchanged);
    }
    let name = series.name().clone();
    let cells: Vec<Option<&str>> = series.str()?.into_iter().collect();

    match attempt(&name, &cells, CoercionTarget::Boolean, parse_boolean_cell) {
        Attempt::Parsed(values) => {
            return Ok(CoercionOutcome::Converted {
                series: Series::new(name, values),
                target: CoercionTarget::Boolean,
            });
        }
        Attempt::Failed(failure) => return Ok(CoercionOutcome::Failed(failure)),
        Attempt::NotApplicable => {}
    }

    match attempt(&name, &cells, CoercionTarget::Numeric, parse_numeric_cell) {
        Attempt::Parsed(values) => {
            return Ok(CoercionOutcome::Converted {
                series: Series::new(name, values),
                target: CoercionTarget::Numeric,
            });
        }
        Attempt::Failed(failure) => return Ok(CoercionOutcome::Failed(failure)),
        Attempt::NotApplicable => {}
    }

    // dates are detected by shape so "2024-13-45" counts as a failed date
    let present: Vec<&str> = cells
        .iter()
        .flatten()
        .copied()
        .filter(|s| !s.trim().is_empty() && !is_error_marker(s))
        .collect();
    let shaped = present.iter().filter(|s| looks_like_date(s)).count();
    if present.is_empty() || (shaped as f64 / present.len() as f64) < DETECTION_RATIO {
        return Ok(CoercionOutcome::Unchanged);
    }

    match attempt(&name, &cells, CoercionTarget::Datetime, parse_datetime_cell) {
        Attempt::Parsed(values) => {
            let millis: Vec<Option<i64>> = values
                .into_iter()
                .map(|v| v.map(|dt| dt.and_utc().timestamp_millis()))
                .collect();
            let series = Series::new(name, millis)
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
            Ok(CoercionOutcome::Converted {
                series,
                target: CoercionTarget::Datetime,
            })
        }
        Attempt::Failed(failure) => Ok(CoercionOutcome::Failed(failure)),
        Attempt::NotApplicable => {
            // shaped like dates, but too few parse
            let invalid: Vec<&str> = present
                .iter()
                .copied()
                .filter(|s| parse_datetime_cell(s).is_invalid())
                .collect();
            let invalid_count = invalid.len();
            let first_invalid = invalid.first().map(|s| s.to_string()).unwrap_or_default();
            Ok(CoercionOutcome::Failed(CoercionFailure {
                column: name.to_string(),
                target: CoercionTarget::Datetime,
                invalid_count,
                reason: format!(
                    "{} date-like values could not be parsed (first: '{}')",
                    invalid_count, first_invalid
                ),
                first_invalid,
            }))
        }
    }
}

/// Coerce every text column of `df`, keeping originals on failure.
pub fn coerce_dataframe(mut df: DataFrame) -> Result<(DataFrame, CoercionReport)> {
    let mut report = CoercionReport::default();
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();

    for name in names {
        let outcome = {
            let series = df.column(&name)?.as_materialized_series();
            coerce_column(series)?
        };
        match outcome {
            CoercionOutcome::Converted { series, target } => {
                debug!("Converted '{}' to {}", name, target);
                df.with_column(series)?;
                report.converted.push(ConvertedColumn {
                    column: name,
                    target,
                });
            }
            CoercionOutcome::Failed(failure) => {
                warn!("Kept '{}' as text: {}", name, failure.reason);
                report.failed.push(failure);
            }
            CoercionOutcome::Unchanged => {}
        }
    }

    info!(
        "Type coercion: {} column(s) converted, {} kept as text after failed parsing",
        report.converted.len(),
        report.failed.len()
    );
    Ok((df, report))
}
