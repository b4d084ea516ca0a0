//! Inferential statistics shared by the bivariate analysers.

mod contingency;
mod correlation;

pub use contingency::{build_contingency, chi_square, sorted_labels};
pub use correlation::{linear_regression, pearson};
