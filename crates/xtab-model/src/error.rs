use thiserror::Error;

/// Errors raised while interpreting model values from text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown statistic '{0}'")]
    UnknownStatistic(String),
    #[error("unknown analysis type '{0}'")]
    UnknownAnalysisType(String),
    #[error("unknown comparator '{0}'")]
    UnknownComparator(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
