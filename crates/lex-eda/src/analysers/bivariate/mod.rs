//! Column-pair analysers.
//!
//! Every analyser works on a cleaned subset: the two columns (and the hue
//! column, when given) with any row missing a value in one of them dropped.
//! The hue only colours plots; it never influences routing or statistics.
//!
//! | first       | second      | analyser           |
//! |-------------|-------------|--------------------|
//! | numerical   | numerical   | [`NumNumAnalyser`]  |
//! | numerical   | categorical | [`NumCatAnalyser`]  |
//! | categorical | categorical | [`CatCatAnalyser`]  |
//! | numerical   | datetime    | [`NumTimeAnalyser`] |
//! | categorical | datetime    | [`CatTimeAnalyser`] |
//!
//! Either column order routes to the same analyser.

mod cat_cat;
mod cat_time;
mod num_cat;
mod num_num;
mod num_time;

pub use cat_cat::CatCatAnalyser;
pub use cat_time::CatTimeAnalyser;
pub use num_cat::NumCatAnalyser;
pub use num_num::NumNumAnalyser;
pub use num_time::NumTimeAnalyser;

use crate::config::EdaConfig;
use crate::error::{EdaError, Result};
use crate::profiler::classify;
use crate::types::{AnalysisResult, PairAnalysis, PairSummary, PlotSpec, ResultKind, SemanticType};
use crate::utils::{column_series, presence_mask, string_values};
use polars::prelude::*;
use tracing::debug;

/// Capabilities shared by every pair analyser.
pub trait PairStrategy {
    /// Name of the summary this strategy computes.
    fn result_kind(&self) -> ResultKind;

    /// False when the cardinality guard trips.
    fn validate(&self) -> bool;

    fn summarize(&self) -> Result<PairSummary>;

    fn visualize(&self) -> Result<Option<PlotSpec>>;

    /// Run the strategy. A failed validation yields the
    /// [`ResultKind::HighCardinality`] status rather than an error.
    fn analyse(&self) -> Result<AnalysisResult> {
        if !self.validate() {
            return Ok(AnalysisResult::high_cardinality());
        }
        Ok(AnalysisResult {
            kind: self.result_kind(),
            summary: Some(self.summarize()?),
            plot: self.visualize()?,
        })
    }
}

/// Select `columns` (duplicates collapsed) and drop rows missing any of them.
pub(crate) fn clean_subset(df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let mut names: Vec<&str> = Vec::with_capacity(columns.len());
    for name in columns {
        column_series(df, name)?;
        if !names.contains(name) {
            names.push(name);
        }
    }

    let subset = df.select(names.iter().copied())?;
    let mut mask = vec![true; subset.height()];
    for column in subset.get_columns() {
        let present = presence_mask(column.as_materialized_series())?;
        for (keep, p) in mask.iter_mut().zip(present) {
            *keep &= p;
        }
    }

    let mask = BooleanChunked::from_slice("mask".into(), &mask);
    Ok(subset.filter(&mask)?)
}

/// Fail with [`EdaError::EmptyInput`] when cleaning left no rows.
pub(crate) fn ensure_rows(frame: &DataFrame, first: &str, second: &str) -> Result<()> {
    if frame.height() == 0 {
        return Err(EdaError::EmptyInput(format!(
            "'{}' vs '{}' after dropping missing values",
            first, second
        )));
    }
    Ok(())
}

/// Values of a column in a cleaned frame as labels.
pub(crate) fn labels(frame: &DataFrame, column: &str) -> Result<Vec<String>> {
    Ok(string_values(column_series(frame, column)?)?
        .into_iter()
        .flatten()
        .collect())
}

/// Hue labels aligned with the cleaned rows.
pub(crate) fn hue_labels(frame: &DataFrame, hue: Option<&str>) -> Result<Option<Vec<String>>> {
    hue.map(|h| labels(frame, h)).transpose()
}

/// Same labels wrapped for the cardinality helpers.
pub(crate) fn as_options(values: &[String]) -> Vec<Option<String>> {
    values.iter().cloned().map(Some).collect()
}

/// A column-pair analyser, selected by the semantic types of both columns.
#[derive(Debug, Clone)]
pub enum PairAnalyser {
    NumNum(NumNumAnalyser),
    NumCat(NumCatAnalyser),
    CatCat(CatCatAnalyser),
    NumTime(NumTimeAnalyser),
    CatTime(CatTimeAnalyser),
}

impl PairAnalyser {
    /// Classify both columns and build the analyser for their type pair.
    pub fn build(
        df: &DataFrame,
        first: &str,
        second: &str,
        hue: Option<&str>,
        config: &EdaConfig,
    ) -> Result<Self> {
        if first == second {
            return Err(EdaError::InvalidPair {
                first: first.to_string(),
                second: second.to_string(),
                reason: "a column cannot be paired with itself".to_string(),
            });
        }
        if let Some(h) = hue {
            column_series(df, h)?;
        }

        let first_type = classify(column_series(df, first)?, config.cat_threshold)?.routing_type();
        let second_type =
            classify(column_series(df, second)?, config.cat_threshold)?.routing_type();
        debug!(
            "Routing pair '{}' ({}) x '{}' ({})",
            first, first_type, second, second_type
        );

        use SemanticType::{Categorical, Datetime, Numerical};
        let analyser = match (first_type, second_type) {
            (Numerical, Numerical) => Self::NumNum(NumNumAnalyser::new(df, first, second, hue)?),
            (Numerical, Categorical) => {
                Self::NumCat(NumCatAnalyser::new(df, first, second, hue, config)?)
            }
            (Categorical, Numerical) => {
                Self::NumCat(NumCatAnalyser::new(df, second, first, hue, config)?)
            }
            (Categorical, Categorical) => {
                Self::CatCat(CatCatAnalyser::new(df, first, second, hue, config)?)
            }
            (Numerical, Datetime) => {
                Self::NumTime(NumTimeAnalyser::new(df, first, second, hue)?)
            }
            (Datetime, Numerical) => {
                Self::NumTime(NumTimeAnalyser::new(df, second, first, hue)?)
            }
            (Categorical, Datetime) => {
                Self::CatTime(CatTimeAnalyser::new(df, first, second, hue, config)?)
            }
            (Datetime, Categorical) => {
                Self::CatTime(CatTimeAnalyser::new(df, second, first, hue, config)?)
            }
            (a, b) => {
                return Err(EdaError::InvalidPair {
                    first: first.to_string(),
                    second: second.to_string(),
                    reason: format!("no analysis for {} x {}", a, b),
                });
            }
        };
        Ok(analyser)
    }

    /// Run the analysis. Categorical-datetime pairs yield one result per
    /// granularity component.
    pub fn analyse(&self) -> Result<PairAnalysis> {
        match self {
            Self::NumNum(a) => Ok(PairAnalysis::Single(a.analyse()?)),
            Self::NumCat(a) => Ok(PairAnalysis::Single(a.analyse()?)),
            Self::CatCat(a) => Ok(PairAnalysis::Single(a.analyse()?)),
            Self::NumTime(a) => Ok(PairAnalysis::Single(a.analyse()?)),
            Self::CatTime(a) => Ok(PairAnalysis::PerPeriod(a.analyse_periods()?)),
        }
    }

    /// Short name of the selected variant.
    pub fn variant(&self) -> &'static str {
        match self {
            Self::NumNum(_) => "num_num",
            Self::NumCat(_) => "num_cat",
            Self::CatCat(_) => "cat_cat",
            Self::NumTime(_) => "num_time",
            Self::CatTime(_) => "cat_time",
        }
    }

    pub fn as_num_time(&self) -> Option<&NumTimeAnalyser> {
        match self {
            Self::NumTime(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_cat_time(&self) -> Option<&CatTimeAnalyser> {
        match self {
            Self::CatTime(a) => Some(a),
            _ => None,
        }
    }
}
