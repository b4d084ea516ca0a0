//! Type classification and analysis dispatch for exploratory data analysis.
//!
//! # Overview
//!
//! Given a Polars [`DataFrame`](polars::prelude::DataFrame), this library:
//!
//! - **Classifies** each column as numerical, categorical, datetime or boolean
//! - **Selects** an analysis strategy per column or column pair from those types
//! - **Computes** the statistics of that strategy (descriptive statistics,
//!   regression, grouped aggregation, contingency tables with chi-square tests,
//!   time granularity and seasonality)
//! - **Guards** against sparse categoricals with a high-cardinality check and
//!   top-K category compression
//! - **Emits** serializable result records and renderer-agnostic plot payloads
//!
//! Built analysers are memoized in an [`AnalyserCache`] shared by the factories.
//! The cache holds the [`EdaConfig`] every factory on it builds with.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use lex_eda::{AnalyserCache, AnalyserFactory, DatasetOverview, EdaConfig, PairAnalyserFactory};
//! use std::sync::Arc;
//!
//! let (df, _report) = lex_eda::cleaner::coerce_dataframe(df)?;
//! let overview = DatasetOverview::from_dataframe(&df)?;
//!
//! let config = EdaConfig::builder().cat_threshold(15).top_k(8).build()?;
//! let cache = Arc::new(AnalyserCache::new(config));
//! let columns = AnalyserFactory::new(Arc::clone(&cache));
//! let pairs = PairAnalyserFactory::new(Arc::clone(&cache));
//!
//! let age = columns.create(&df, "age")?.analyse(&overview)?;
//! println!("{} is {}", age.column, age.dtype);
//!
//! match pairs.create(&df, "age", "fare", None)?.analyse()? {
//!     PairAnalysis::Single(result) => println!("{}", result.kind.display_name()),
//!     PairAnalysis::PerPeriod(results) => println!("{} periods", results.len()),
//! }
//!
//! // after editing the dataset
//! cache.invalidate();
//! ```
//!
//! # Results
//!
//! Analysis failures that callers can act on are values, not errors: a
//! categorical that is too sparse to group yields
//! [`ResultKind::HighCardinality`] with no summary. Empty inputs, degenerate
//! statistics and unknown method names are [`EdaError`]s.

pub mod analysers;
pub mod cleaner;
pub mod config;
pub mod error;
pub mod factory;
pub mod profiler;
pub mod stats;
pub mod types;
pub mod utils;

pub use analysers::{ColumnAnalyser, ColumnStrategy, PairAnalyser, PairStrategy};
pub use cleaner::{CoercionOutcome, CoercionReport, CoercionTarget, coerce_dataframe};
pub use config::{ConfigValidationError, EdaConfig, EdaConfigBuilder};
pub use error::{EdaError, Result, ResultExt};
pub use factory::{AnalyserCache, AnalyserFactory, PairAnalyserFactory, PairKey};
pub use profiler::DataProfiler;
pub use types::{
    AnalysisResult, DatasetOverview, PairAnalysis, PairSummary, PlotSpec, ResultKind,
    SemanticType, TimeComponent, UnivariateResult,
};
