//! Analysis strategies for single columns and column pairs.
//!
//! Strategies are closed enums ([`ColumnAnalyser`], [`PairAnalyser`]) whose
//! variants implement a fixed capability trait ([`ColumnStrategy`],
//! [`PairStrategy`]). The variant is chosen once, from semantic types, when
//! the analyser is built.

pub mod bivariate;
pub mod univariate;

pub use bivariate::{
    CatCatAnalyser, CatTimeAnalyser, NumCatAnalyser, NumNumAnalyser, NumTimeAnalyser,
    PairAnalyser, PairStrategy,
};
pub use univariate::{
    CategoricalAnalyser, ColumnAnalyser, ColumnStrategy, DatetimeAnalyser, NumericalAnalyser,
};
