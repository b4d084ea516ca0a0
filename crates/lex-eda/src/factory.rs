//! Analyser selection and memoization.
//!
//! Factories classify the requested columns, build the matching analyser and
//! keep it in an [`AnalyserCache`] so repeat requests reuse the cleaned data.
//!
//! The cache owns the [`EdaConfig`] its analysers were built with, so every
//! factory sharing a cache classifies with the same thresholds.
//!
//! The cache cannot see dataset mutation. Hosts must call
//! [`AnalyserCache::invalidate`] (or a factory's `invalidate`) whenever the
//! dataset changes.
//!
//! ```rust,ignore
//! use lex_eda::{AnalyserCache, AnalyserFactory, PairAnalyserFactory, EdaConfig};
//! use std::sync::Arc;
//!
//! let cache = Arc::new(AnalyserCache::new(EdaConfig::default()));
//! let columns = AnalyserFactory::new(Arc::clone(&cache));
//! let pairs = PairAnalyserFactory::new(Arc::clone(&cache));
//!
//! let age = columns.create(&df, "age")?;
//! let pair = pairs.create(&df, "age", "fare", Some("sex"))?;
//! ```

use crate::analysers::{ColumnAnalyser, PairAnalyser};
use crate::config::EdaConfig;
use crate::error::Result;
use parking_lot::Mutex;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Cache key of a column pair. Lookups try both column orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
    pub first: String,
    pub second: String,
    pub hue: Option<String>,
}

impl PairKey {
    pub fn new(first: &str, second: &str, hue: Option<&str>) -> Self {
        Self {
            first: first.to_string(),
            second: second.to_string(),
            hue: hue.map(str::to_string),
        }
    }

    /// The same pair with the columns swapped.
    pub fn reversed(&self) -> Self {
        Self {
            first: self.second.clone(),
            second: self.first.clone(),
            hue: self.hue.clone(),
        }
    }
}

/// Built analysers for the current dataset and the config they were built
/// with, shared between factories.
///
/// Each map is guarded by its own lock; lookup and construction happen under
/// that lock so concurrent first requests build an analyser only once.
#[derive(Debug, Default)]
pub struct AnalyserCache {
    config: EdaConfig,
    columns: Mutex<HashMap<String, Arc<ColumnAnalyser>>>,
    pairs: Mutex<HashMap<PairKey, Arc<PairAnalyser>>>,
}

impl AnalyserCache {
    pub fn new(config: EdaConfig) -> Self {
        Self {
            config,
            columns: Mutex::default(),
            pairs: Mutex::default(),
        }
    }

    pub fn config(&self) -> &EdaConfig {
        &self.config
    }

    /// Drop every cached analyser.
    pub fn invalidate(&self) {
        let mut columns = self.columns.lock();
        let mut pairs = self.pairs.lock();
        debug!(
            "Invalidating analyser cache ({} column, {} pair entries)",
            columns.len(),
            pairs.len()
        );
        columns.clear();
        pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.columns.lock().len() + self.pairs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn column_or_insert(
        &self,
        column: &str,
        build: impl FnOnce() -> Result<ColumnAnalyser>,
    ) -> Result<Arc<ColumnAnalyser>> {
        let mut columns = self.columns.lock();
        if let Some(analyser) = columns.get(column) {
            debug!("Analyser cache hit for '{}'", column);
            return Ok(Arc::clone(analyser));
        }
        debug!("Analyser cache miss for '{}'", column);
        let analyser = Arc::new(build()?);
        columns.insert(column.to_string(), Arc::clone(&analyser));
        Ok(analyser)
    }

    fn pair_or_insert(
        &self,
        key: PairKey,
        build: impl FnOnce() -> Result<PairAnalyser>,
    ) -> Result<Arc<PairAnalyser>> {
        let mut pairs = self.pairs.lock();
        let cached = pairs.get(&key).or_else(|| pairs.get(&key.reversed()));
        if let Some(analyser) = cached {
            debug!(
                "Pair analyser cache hit for '{}' x '{}'",
                key.first, key.second
            );
            return Ok(Arc::clone(analyser));
        }
        debug!(
            "Pair analyser cache miss for '{}' x '{}'",
            key.first, key.second
        );
        let analyser = Arc::new(build()?);
        pairs.insert(key, Arc::clone(&analyser));
        Ok(analyser)
    }
}

/// Builds and memoizes single-column analysers.
#[derive(Debug, Clone)]
pub struct AnalyserFactory {
    cache: Arc<AnalyserCache>,
}

impl AnalyserFactory {
    pub fn new(cache: Arc<AnalyserCache>) -> Self {
        Self { cache }
    }

    pub fn config(&self) -> &EdaConfig {
        self.cache.config()
    }

    /// The analyser for `column`, built on first request.
    pub fn create(&self, df: &DataFrame, column: &str) -> Result<Arc<ColumnAnalyser>> {
        self.cache.column_or_insert(column, || {
            ColumnAnalyser::build(df, column, self.cache.config())
        })
    }

    /// Clear the shared cache after the dataset changed.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

/// Builds and memoizes column-pair analysers.
#[derive(Debug, Clone)]
pub struct PairAnalyserFactory {
    cache: Arc<AnalyserCache>,
}

impl PairAnalyserFactory {
    pub fn new(cache: Arc<AnalyserCache>) -> Self {
        Self { cache }
    }

    pub fn config(&self) -> &EdaConfig {
        self.cache.config()
    }

    /// The analyser for the pair, built on first request. `(a, b)` and
    /// `(b, a)` with the same hue share one analyser.
    pub fn create(
        &self,
        df: &DataFrame,
        first: &str,
        second: &str,
        hue: Option<&str>,
    ) -> Result<Arc<PairAnalyser>> {
        self.cache
            .pair_or_insert(PairKey::new(first, second, hue), || {
                PairAnalyser::build(df, first, second, hue, self.cache.config())
            })
    }

    /// Clear the shared cache after the dataset changed.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }
}

static_assertions::assert_impl_all!(AnalyserCache: Send, Sync);
static_assertions::assert_impl_all!(AnalyserFactory: Send, Sync);
static_assertions::assert_impl_all!(PairAnalyserFactory: Send, Sync);
