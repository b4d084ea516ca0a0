//! Cardinality guard and top-K category compression.

use crate::error::Result;
use crate::types::CategoryCount;
use crate::utils::{count_distinct, string_values};
use polars::prelude::*;
use std::collections::HashMap;

/// Label of the bucket holding everything outside the top K.
pub const OTHERS_LABEL: &str = "Others";

/// True when `distinct / length > threshold`.
///
/// Missing values count toward the length but not toward the distinct
/// count. Empty input is never high-cardinality.
pub fn is_high_cardinality(values: &[Option<String>], threshold: f64) -> bool {
    if values.is_empty() {
        return false;
    }
    let distinct = count_distinct(values.iter().flatten());
    distinct as f64 / values.len() as f64 > threshold
}

/// [`is_high_cardinality`] over a series of any dtype.
pub fn is_high_cardinality_series(series: &Series, threshold: f64) -> Result<bool> {
    Ok(is_high_cardinality(&string_values(series)?, threshold))
}

/// Frequency table, most frequent first, ties in first-seen order.
pub fn category_counts(values: &[Option<String>]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, value) in values.iter().flatten().enumerate() {
        counts.entry(value.as_str()).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<(&str, usize, usize)> = counts
        .into_iter()
        .map(|(value, (count, first_seen))| (value, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    ranked
        .into_iter()
        .map(|(value, count, _)| CategoryCount {
            value: value.to_string(),
            count,
        })
        .collect()
}

/// The `k` most frequent values. An existing `"Others"` never takes a slot.
pub fn top_categories(values: &[Option<String>], k: usize) -> Vec<String> {
    category_counts(values)
        .into_iter()
        .filter(|c| c.value != OTHERS_LABEL)
        .take(k)
        .map(|c| c.value)
        .collect()
}

/// Replace every value outside the top `k` with `"Others"`.
///
/// Length and missing positions are preserved, the result has at most `k + 1`
/// distinct values, and compressing twice changes nothing.
pub fn compress_categories(values: &[Option<String>], k: usize) -> Vec<Option<String>> {
    let keep = top_categories(values, k);
    values
        .iter()
        .map(|value| {
            value.as_ref().map(|v| {
                if keep.contains(v) {
                    v.clone()
                } else {
                    OTHERS_LABEL.to_string()
                }
            })
        })
        .collect()
}

/// [`compress_categories`] over a series; the result is a `String` series
/// with the same name.
pub fn compress_series(series: &Series, k: usize) -> Result<Series> {
    let compressed = compress_categories(&string_values(series)?, k);
    Ok(Series::new(series.name().clone(), compressed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn owned(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    // ==================== is_high_cardinality tests ====================

    #[test]
    fn test_singletons_are_high_cardinality() {
        let values = owned(&[
            Some("a"),
            Some("b"),
            Some("c"),
            Some("d"),
            Some("e"),
            Some("f"),
            Some("g"),
            Some("h"),
        ]);
        assert!(is_high_cardinality(&values, 0.5));
    }

    #[test]
    fn test_ratio_at_threshold_is_not_high() {
        let values = owned(&[Some("a"), Some("b"), Some("a"), Some("b")]);
        assert!(!is_high_cardinality(&values, 0.5));
    }

    #[test]
    fn test_empty_is_not_high() {
        assert!(!is_high_cardinality(&[], 0.5));
    }

    #[test]
    fn test_permutation_invariance() {
        let values = owned(&[Some("a"), Some("b"), Some("c"), Some("a"), Some("d")]);
        let mut reversed = values.clone();
        reversed.reverse();
        assert_eq!(
            is_high_cardinality(&values, 0.5),
            is_high_cardinality(&reversed, 0.5)
        );
    }

    #[test]
    fn test_duplication_never_trips_guard() {
        let values = owned(&[Some("a"), Some("b"), Some("a"), Some("c")]);
        let mut doubled = values.clone();
        doubled.extend(values.clone());
        assert!(!is_high_cardinality(&values, 0.75));
        assert!(!is_high_cardinality(&doubled, 0.75));
    }

    // ==================== compress_categories tests ====================

    #[test]
    fn test_compress_keeps_top_k() {
        let values = owned(&[
            Some("a"),
            Some("a"),
            Some("a"),
            Some("b"),
            Some("b"),
            Some("c"),
            None,
            Some("d"),
        ]);
        let compressed = compress_categories(&values, 2);
        assert_eq!(
            compressed,
            owned(&[
                Some("a"),
                Some("a"),
                Some("a"),
                Some("b"),
                Some("b"),
                Some("Others"),
                None,
                Some("Others"),
            ])
        );
    }

    #[test]
    fn test_compress_ties_use_first_seen_order() {
        let values = owned(&[Some("z"), Some("y"), Some("x"), Some("y"), Some("z")]);
        // z and y both appear twice; z was seen first
        assert_eq!(top_categories(&values, 1), vec!["z".to_string()]);
    }

    #[test]
    fn test_compress_properties() {
        let values: Vec<Option<String>> = (0..50)
            .map(|i| if i % 7 == 0 { None } else { Some(format!("v{}", i % 13)) })
            .collect();
        let k = 4;
        let once = compress_categories(&values, k);

        assert_eq!(once.len(), values.len());
        for (before, after) in values.iter().zip(&once) {
            assert_eq!(before.is_none(), after.is_none());
        }
        assert!(count_distinct(once.iter().flatten()) <= k + 1);

        let kept: usize = category_counts(&values).iter().take(k).map(|c| c.count).sum();
        let total = values.iter().flatten().count();
        let others = once.iter().flatten().filter(|v| *v == OTHERS_LABEL).count();
        assert_eq!(others, total - kept);

        assert_eq!(compress_categories(&once, k), once);
    }

    #[test]
    fn test_existing_others_is_sentinel() {
        let values = owned(&[Some("Others"), Some("Others"), Some("Others"), Some("a"), Some("b")]);
        let compressed = compress_categories(&values, 1);
        assert_eq!(
            compressed,
            owned(&[Some("Others"), Some("Others"), Some("Others"), Some("a"), Some("Others")])
        );
    }

    #[test]
    fn test_compress_series_keeps_name() {
        let series = Series::new("grade".into(), &[1i64, 1, 2, 3]);
        let compressed = compress_series(&series, 1).unwrap();
        assert_eq!(compressed.name().as_str(), "grade");
        assert_eq!(compressed.str().unwrap().get(3), Some("Others"));
    }
}
