use super::{PairStrategy, as_options, clean_subset, ensure_rows, labels};
use crate::config::EdaConfig;
use crate::error::Result;
use crate::profiler::{compress_categories, infer_series_granularity, period_bin};
use crate::stats::{build_contingency, chi_square, sorted_labels};
use crate::types::{
    AnalysisResult, ContingencyTable, PairSummary, PeriodResult, PlotSpec, ResultKind,
    TimeComponent,
};
use crate::utils::{column_series, datetime_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Association between a categorical column and the calendar periods of a
/// datetime column.
///
/// There is no single summary: each granularity component gets its own
/// contingency table (category by binned period) and chi-square test.
#[derive(Debug, Clone)]
pub struct CatTimeAnalyser {
    cat: String,
    time: String,
    frame: DataFrame,
    granularity: Vec<TimeComponent>,
    top_k: usize,
}

impl CatTimeAnalyser {
    pub fn new(
        df: &DataFrame,
        cat: &str,
        time: &str,
        hue: Option<&str>,
        config: &EdaConfig,
    ) -> Result<Self> {
        let mut columns = vec![cat, time];
        columns.extend(hue);
        let granularity = infer_series_granularity(column_series(df, time)?)?;
        Ok(Self {
            cat: cat.to_string(),
            time: time.to_string(),
            frame: clean_subset(df, &columns)?,
            granularity,
            top_k: config.top_k,
        })
    }

    pub fn granularity(&self) -> &[TimeComponent] {
        &self.granularity
    }

    /// Compressed categories by binned `period`. Category rows are sorted,
    /// period columns run chronologically; only observed labels appear.
    pub fn contingency_table(&self, period: TimeComponent) -> Result<ContingencyTable> {
        ensure_rows(&self.frame, &self.cat, &self.time)?;
        let categories: Vec<String> =
            compress_categories(&as_options(&labels(&self.frame, &self.cat)?), self.top_k)
                .into_iter()
                .flatten()
                .collect();

        let mut ordered_bins: BTreeMap<i64, String> = BTreeMap::new();
        let periods: Vec<String> = datetime_values(column_series(&self.frame, &self.time)?)?
            .into_iter()
            .flatten()
            .map(|t| {
                let bin = period_bin(period, period.extract(&t));
                ordered_bins.entry(bin.order).or_insert_with(|| bin.label.clone());
                bin.label
            })
            .collect();

        let row_labels = sorted_labels(&categories);
        let column_labels = ordered_bins.into_values().collect();
        build_contingency(&categories, &periods, row_labels, column_labels)
    }

    /// Contingency and chi-square test for one period.
    pub fn analyse_period(&self, period: TimeComponent) -> Result<AnalysisResult> {
        PeriodView {
            analyser: self,
            period,
        }
        .analyse()
    }

    /// [`CatTimeAnalyser::analyse_period`] with the period given by name.
    pub fn analyse_period_named(&self, period: &str) -> Result<AnalysisResult> {
        self.analyse_period(period.parse()?)
    }

    /// One result per granularity component, finest first. Empty when the
    /// datetime column does not vary.
    pub fn analyse_periods(&self) -> Result<Vec<PeriodResult>> {
        debug!(
            "Analysing '{}' by {} period(s) of '{}'",
            self.cat,
            self.granularity.len(),
            self.time
        );
        self.granularity
            .iter()
            .map(|period| {
                Ok(PeriodResult {
                    period: *period,
                    result: self.analyse_period(*period)?,
                })
            })
            .collect()
    }
}

/// A categorical-datetime analyser fixed to one period.
struct PeriodView<'a> {
    analyser: &'a CatTimeAnalyser,
    period: TimeComponent,
}

impl PairStrategy for PeriodView<'_> {
    fn result_kind(&self) -> ResultKind {
        ResultKind::ChiSquare
    }

    fn validate(&self) -> bool {
        true
    }

    fn summarize(&self) -> Result<PairSummary> {
        let table = self.analyser.contingency_table(self.period)?;
        let test = chi_square(&table)?;
        Ok(PairSummary::Contingency { table, test })
    }

    fn visualize(&self) -> Result<Option<PlotSpec>> {
        let table = self.analyser.contingency_table(self.period)?;
        Ok(Some(PlotSpec::Contingency {
            rows: self.analyser.cat.clone(),
            columns: self.period.as_str().to_string(),
            row_shares: table.row_shares(),
            table,
        }))
    }
}
