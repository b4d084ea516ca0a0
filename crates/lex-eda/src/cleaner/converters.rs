//! Cell-level parsers for coercing text columns.
//!
//! Every parser distinguishes three cases: a parsed value, a missing marker
//! (empty string, `n/a`, ...) that becomes null, and a value that does not
//! parse at all.

use crate::utils::{is_error_marker, parse_numeric_string};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

// Date pattern regexes - compiled once at startup
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}[-/]\d{1,2}[-/]\d{1,2}$").expect("Invalid regex: YYYY-MM-DD"),
        Regex::new(r"^\d{1,2}[-/]\d{1,2}[-/]\d{4}$").expect("Invalid regex: MM-DD-YYYY"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}(:\d{2}(\.\d+)?)?$")
            .expect("Invalid regex: datetime"),
        Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}").expect("Invalid regex: ISO"),
    ]
});

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%m-%d-%Y"];

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
];

const TRUE_VALUES: [&str; 4] = ["true", "t", "yes", "y"];
const FALSE_VALUES: [&str; 4] = ["false", "f", "no", "n"];

/// Result of parsing one cell.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Cell<T> {
    Value(T),
    Missing,
    Invalid,
}

impl<T> Cell<T> {
    pub(crate) fn is_invalid(&self) -> bool {
        matches!(self, Cell::Invalid)
    }

    pub(crate) fn into_option(self) -> Option<T> {
        match self {
            Cell::Value(v) => Some(v),
            _ => None,
        }
    }
}

fn classify_cell<T>(raw: &str, parse: impl Fn(&str) -> Option<T>) -> Cell<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_error_marker(trimmed) {
        return Cell::Missing;
    }
    match parse(trimmed) {
        Some(v) => Cell::Value(v),
        None => Cell::Invalid,
    }
}

/// Parse a number, tolerating currency symbols, percent signs and thousands
/// separators.
pub(crate) fn parse_numeric_cell(raw: &str) -> Cell<f64> {
    classify_cell(raw, |s| parse_numeric_string(s).filter(|v| v.is_finite()))
}

/// Parse a boolean word (`true`/`false`, `yes`/`no`, `t`/`f`, `y`/`n`).
///
/// `1`/`0` are left to the numeric parser.
pub(crate) fn parse_boolean_cell(raw: &str) -> Cell<bool> {
    classify_cell(raw, |s| {
        let lower = s.to_ascii_lowercase();
        if TRUE_VALUES.contains(&lower.as_str()) {
            Some(true)
        } else if FALSE_VALUES.contains(&lower.as_str()) {
            Some(false)
        } else {
            None
        }
    })
}

/// Whether a string has the shape of a date or datetime.
pub(crate) fn looks_like_date(s: &str) -> bool {
    let trimmed = s.trim();
    DATE_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

/// Parse a date or datetime. Offsets are normalized to UTC.
pub(crate) fn parse_datetime_cell(raw: &str) -> Cell<NaiveDateTime> {
    classify_cell(raw, |s| {
        if !looks_like_date(s) {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.naive_utc());
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Some(dt);
            }
        }
        DATE_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    })
}
