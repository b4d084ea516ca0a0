//! Descriptive statistics over cleaned `f64` slices.
//!
//! Callers strip missing values first; nothing here looks at nulls or `NaN`.

use crate::error::{EdaError, Result};
use crate::types::{BoxPlotSummary, HistogramBin, NumericSummary};

/// Default number of histogram bins for distribution plots.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Quantile of an ascending slice with linear interpolation between ranks.
pub fn quantile_sorted(values: &[f64], quantile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let pos = quantile.clamp(0.0, 1.0) * (values.len() as f64 - 1.0);
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return values[lower];
    }
    let weight = pos - lower as f64;
    values[lower] + (values[upper] - values[lower]) * weight
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n as f64 - 1.0);
    Some(variance.sqrt())
}

/// Adjusted Fisher-Pearson skewness, `sqrt(n(n-1)) / (n-2) * m3 / m2^1.5`.
///
/// Constant data has zero skew.
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let mean = mean(values)?;
    let nf = n as f64;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / nf;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / nf;
    if m2 <= f64::EPSILON * mean.abs().max(1.0) {
        return Some(0.0);
    }
    let g1 = m3 / m2.powf(1.5);
    Some((nf * (nf - 1.0)).sqrt() / (nf - 2.0) * g1)
}

/// Sort a copy of `values` ascending.
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Full descriptive summary of a numerical column.
pub fn numeric_summary(values: &[f64], column: &str) -> Result<NumericSummary> {
    if values.is_empty() {
        return Err(EdaError::EmptyInput(format!("column '{}'", column)));
    }
    let sorted = sorted_copy(values);
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let q1 = quantile_sorted(&sorted, 0.25);
    let q3 = quantile_sorted(&sorted, 0.75);

    Ok(NumericSummary {
        mean: mean(values).unwrap_or(0.0),
        std: sample_std(values),
        min,
        max,
        q1,
        q3,
        iqr: q3 - q1,
        range: max - min,
        skewness: skewness(values),
    })
}

/// Five-number summary for a box plot. Expects ascending input.
pub fn box_plot_summary(sorted: &[f64]) -> BoxPlotSummary {
    BoxPlotSummary {
        min: sorted.first().copied().unwrap_or(0.0),
        q1: quantile_sorted(sorted, 0.25),
        median: quantile_sorted(sorted, 0.5),
        q3: quantile_sorted(sorted, 0.75),
        max: sorted.last().copied().unwrap_or(0.0),
    }
}

/// Equal-width histogram. Expects ascending input; the last bin is closed.
pub fn build_histogram(sorted: &[f64], bins: usize) -> Vec<HistogramBin> {
    if sorted.is_empty() {
        return Vec::new();
    }

    let min = sorted.first().copied().unwrap_or(0.0);
    let max = sorted.last().copied().unwrap_or(min);
    if (max - min).abs() < f64::EPSILON {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: sorted.len(),
        }];
    }

    let bin_count = bins.max(1);
    let width = (max - min) / bin_count as f64;
    let mut counts = vec![0usize; bin_count];

    for value in sorted {
        let index = (((value - min) / width) as usize).min(bin_count - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| HistogramBin {
            start: min + idx as f64 * width,
            end: min + (idx as f64 + 1.0) * width,
            count,
        })
        .collect()
}
