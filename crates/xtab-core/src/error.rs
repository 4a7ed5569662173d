//! Error types for the cross-tabulation engine.

use polars::prelude::PolarsError;
use thiserror::Error;

/// Errors raised while computing a crosstab or its statistics.
///
/// Every variant except [`CrosstabError::Polars`] describes a problem with
/// the request or the data and maps to a client error.
#[derive(Debug, Error)]
pub enum CrosstabError {
    /// A referenced variable is not in the dataset.
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// A custom variable or filter definition is malformed.
    #[error("invalid condition: {message}")]
    InvalidCondition { message: String },

    /// Nothing is left to tabulate.
    #[error("crosstab is empty: {message}")]
    EmptyTable { message: String },

    /// A test was requested on a table it cannot handle.
    #[error("{test} requires a 2x2 table, got {rows}x{cols}")]
    InvalidTableShape {
        test: &'static str,
        rows: usize,
        cols: usize,
    },

    /// Degenerate numeric input for a test.
    #[error("{test} failed: {message}")]
    StatisticalTest { test: &'static str, message: String },

    /// The request's axis or multi-response configuration is inconsistent.
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },

    /// The weight column holds values that cannot weight a count.
    #[error("invalid weight column '{column}': {message}")]
    InvalidWeight { column: String, message: String },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

impl CrosstabError {
    pub(crate) fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    pub(crate) fn invalid_condition(message: impl Into<String>) -> Self {
        Self::InvalidCondition {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn statistical(test: &'static str, message: impl Into<String>) -> Self {
        Self::StatisticalTest {
            test,
            message: message.into(),
        }
    }

    /// HTTP-style status an outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Polars(_) => 500,
            _ => 400,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ColumnNotFound { .. } => "column_not_found",
            Self::InvalidCondition { .. } => "invalid_condition",
            Self::EmptyTable { .. } => "empty_table",
            Self::InvalidTableShape { .. } => "invalid_table_shape",
            Self::StatisticalTest { .. } => "statistical_test",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::InvalidWeight { .. } => "invalid_weight",
            Self::Polars(_) => "internal",
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, CrosstabError>;
