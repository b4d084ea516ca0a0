//! Custom error types for the analysis engine.
//!
//! Recoverable analysis conditions (a tripped cardinality guard) are *not*
//! errors; they are reported through [`crate::types::ResultKind`]. Everything
//! here is a hard failure the caller has to handle: missing columns, inputs
//! with nothing left to analyse, and unsupported method names.
//!
//! Errors are serializable so a frontend can display them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis engine.
#[derive(Error, Debug)]
pub enum EdaError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Column holds no non-null values, so its type is unknown.
    #[error("Column '{0}' has no non-null values")]
    EmptyColumn(String),

    /// Nothing left to analyse after dropping missing values.
    #[error("No rows left to analyse for {0}")]
    EmptyInput(String),

    /// A statistic is undefined for the given data (constant column, too few rows).
    #[error("Cannot compute {statistic} for {context}: {reason}")]
    InsufficientData {
        statistic: String,
        context: String,
        reason: String,
    },

    /// An unknown method or period name was passed to a strategy selector.
    #[error("Unsupported {kind}: '{name}'")]
    UnsupportedMethod { kind: String, name: String },

    /// The column pair has no analysis strategy.
    #[error("Cannot analyse '{first}' against '{second}': {reason}")]
    InvalidPair {
        first: String,
        second: String,
        reason: String,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EdaError>,
    },
}

impl EdaError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EdaError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Shorthand for [`EdaError::UnsupportedMethod`].
    pub fn unsupported(kind: impl Into<String>, name: impl Into<String>) -> Self {
        EdaError::UnsupportedMethod {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Shorthand for [`EdaError::InsufficientData`].
    pub fn insufficient(
        statistic: impl Into<String>,
        context: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EdaError::InsufficientData {
            statistic: statistic.into(),
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Get error code for frontend handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::EmptyColumn(_) => "EMPTY_COLUMN",
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::InsufficientData { .. } => "INSUFFICIENT_DATA",
            Self::UnsupportedMethod { .. } => "UNSUPPORTED_METHOD",
            Self::InvalidPair { .. } => "INVALID_PAIR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error means "type unknown" for a column rather than a bug.
    ///
    /// Presentation layers skip such columns instead of aborting.
    pub fn is_type_unknown(&self) -> bool {
        match self {
            Self::EmptyColumn(_) => true,
            Self::WithContext { source, .. } => source.is_type_unknown(),
            _ => false,
        }
    }

    /// Check if this error is recoverable by picking different inputs.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::EmptyColumn(_)
            | Self::EmptyInput(_)
            | Self::InsufficientData { .. }
            | Self::InvalidPair { .. } => true,
            Self::WithContext { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }
}

impl Serialize for EdaError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EdaError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, EdaError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EdaError::Polars(e).with_context(context))
    }
}
