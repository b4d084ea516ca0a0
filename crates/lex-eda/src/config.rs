//! Configuration types for the analysis engine.
//!
//! Upstream call sites historically disagreed on the numeric-to-categorical
//! boundary (10 in some places, 20 in others). There is exactly one knob here,
//! [`EdaConfig::cat_threshold`], defaulting to 20.

use serde::{Deserialize, Serialize};

/// Default distinct-count boundary below which a numeric column is categorical.
pub const DEFAULT_CAT_THRESHOLD: usize = 20;

/// Default number of categories kept by top-K compression.
pub const DEFAULT_TOP_K: usize = 10;

/// Default distinct/length ratio above which a column is high-cardinality.
pub const DEFAULT_HIGH_CARDINALITY_THRESHOLD: f64 = 0.5;

/// Configuration for type classification and analysis.
///
/// Use [`EdaConfig::builder()`] for a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use lex_eda::config::EdaConfig;
///
/// let config = EdaConfig::builder()
///     .cat_threshold(10)
///     .top_k(5)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaConfig {
    /// Numeric columns with fewer distinct values than this are categorical.
    /// Default: 20
    pub cat_threshold: usize,

    /// Number of most frequent categories kept before bucketing into "Others".
    /// Default: 10
    pub top_k: usize,

    /// Distinct/length ratio above which categorical analysis is skipped.
    /// Default: 0.5
    pub high_cardinality_threshold: f64,
}

impl Default for EdaConfig {
    fn default() -> Self {
        Self {
            cat_threshold: DEFAULT_CAT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            high_cardinality_threshold: DEFAULT_HIGH_CARDINALITY_THRESHOLD,
        }
    }
}

impl EdaConfig {
    /// Create a new configuration builder.
    pub fn builder() -> EdaConfigBuilder {
        EdaConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.cat_threshold == 0 {
            return Err(ConfigValidationError::InvalidCatThreshold(
                self.cat_threshold,
            ));
        }

        if self.top_k == 0 {
            return Err(ConfigValidationError::InvalidTopK(self.top_k));
        }

        if !(self.high_cardinality_threshold > 0.0 && self.high_cardinality_threshold <= 1.0) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "high_cardinality_threshold".to_string(),
                value: self.high_cardinality_threshold,
            });
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be in (0.0, 1.0])")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid categorical threshold: {0} (must be at least 1)")]
    InvalidCatThreshold(usize),

    #[error("Invalid top-k: {0} (must be at least 1)")]
    InvalidTopK(usize),
}

impl From<ConfigValidationError> for crate::error::EdaError {
    fn from(err: ConfigValidationError) -> Self {
        crate::error::EdaError::InvalidConfig(err.to_string())
    }
}

/// Builder for [`EdaConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct EdaConfigBuilder {
    cat_threshold: Option<usize>,
    top_k: Option<usize>,
    high_cardinality_threshold: Option<f64>,
}

impl EdaConfigBuilder {
    /// Set the distinct-count boundary between categorical and numerical.
    pub fn cat_threshold(mut self, threshold: usize) -> Self {
        self.cat_threshold = Some(threshold);
        self
    }

    /// Set how many categories survive top-K compression.
    pub fn top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }

    /// Set the high-cardinality ratio.
    ///
    /// # Arguments
    /// * `threshold` - Value in (0.0, 1.0] (e.g., 0.5 = more than half the rows are distinct)
    pub fn high_cardinality_threshold(mut self, threshold: f64) -> Self {
        self.high_cardinality_threshold = Some(threshold);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `EdaConfig` or an error if validation fails.
    pub fn build(self) -> Result<EdaConfig, ConfigValidationError> {
        let config = EdaConfig {
            cat_threshold: self.cat_threshold.unwrap_or(DEFAULT_CAT_THRESHOLD),
            top_k: self.top_k.unwrap_or(DEFAULT_TOP_K),
            high_cardinality_threshold: self
                .high_cardinality_threshold
                .unwrap_or(DEFAULT_HIGH_CARDINALITY_THRESHOLD),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EdaConfig::default();
        assert_eq!(config.cat_threshold, 20);
        assert_eq!(config.top_k, 10);
        assert_eq!(config.high_cardinality_threshold, 0.5);
    }

    #[test]
    fn test_builder_defaults_match_default() {
        let config = EdaConfig::builder().build().unwrap();
        assert_eq!(config, EdaConfig::default());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = EdaConfig::builder()
            .cat_threshold(10)
            .top_k(5)
            .high_cardinality_threshold(0.8)
            .build()
            .unwrap();

        assert_eq!(config.cat_threshold, 10);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.high_cardinality_threshold, 0.8);
    }

    #[test]
    fn test_validation_invalid_threshold() {
        let result = EdaConfig::builder().high_cardinality_threshold(0.0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidThreshold { .. }
        ));

        let result = EdaConfig::builder().high_cardinality_threshold(1.5).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_zero_top_k() {
        let result = EdaConfig::builder().top_k(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidTopK(0)
        ));
    }

    #[test]
    fn test_validation_zero_cat_threshold() {
        let result = EdaConfig::builder().cat_threshold(0).build();
        assert!(matches!(
            result.unwrap_err(),
            ConfigValidationError::InvalidCatThreshold(0)
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "cat_threshold": 10,
            "top_k": 8,
            "high_cardinality_threshold": 0.3
        }"#;

        let config: EdaConfig = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(config.cat_threshold, 10);
        assert_eq!(config.top_k, 8);
        assert_eq!(config.high_cardinality_threshold, 0.3);
        assert!(config.validate().is_ok());
    }
}
