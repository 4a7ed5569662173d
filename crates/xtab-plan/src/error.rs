//! Error types for plan execution.

use thiserror::Error;
use xtab_core::CrosstabError;
use xtab_model::AnalysisType;

/// Errors raised while executing an analysis plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// The plan names fewer variables than its analysis needs.
    #[error("{analysis} analysis needs at least {needed} variable(s), got {found}")]
    InsufficientVariables {
        analysis: AnalysisType,
        needed: usize,
        found: usize,
    },

    #[error(transparent)]
    Crosstab(#[from] CrosstabError),
}

impl PlanError {
    /// HTTP-style status an outer layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InsufficientVariables { .. } => 400,
            Self::Crosstab(err) => err.status_code(),
        }
    }
}

/// Result type for plan operations.
pub type Result<T> = std::result::Result<T, PlanError>;
