//! Semantic type classification for columns.

use crate::error::{EdaError, Result};
use crate::types::SemanticType;
use crate::utils::{
    DtypeCategory, count_distinct_f64, get_dtype_category, numeric_values, presence_mask,
};
use polars::prelude::*;

/// Classify a column into its semantic type.
///
/// Missing values are ignored. Order of checks:
/// 1. boolean dtype → boolean
/// 2. date/datetime dtype → datetime
/// 3. numeric dtype → categorical when it has fewer than `cat_threshold`
///    distinct values, numerical otherwise
/// 4. anything else → categorical
///
/// A column with no non-missing values has no type and yields
/// [`EdaError::EmptyColumn`].
pub fn classify(series: &Series, cat_threshold: usize) -> Result<SemanticType> {
    let present = presence_mask(series)?.into_iter().filter(|p| *p).count();
    if present == 0 {
        return Err(EdaError::EmptyColumn(series.name().to_string()));
    }

    let semantic = match get_dtype_category(series.dtype()) {
        DtypeCategory::Boolean => SemanticType::Boolean,
        DtypeCategory::Datetime => SemanticType::Datetime,
        DtypeCategory::Numeric => {
            let values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
            if count_distinct_f64(&values) < cat_threshold {
                SemanticType::Categorical
            } else {
                SemanticType::Numerical
            }
        }
        DtypeCategory::String | DtypeCategory::Other => SemanticType::Categorical,
    };

    Ok(semantic)
}
