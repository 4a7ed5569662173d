//! Shared types for survey cross-tabulation.
//!
//! Requests, custom-variable definitions, analysis plans, and the in-memory
//! [`Dataset`] all live here so the engine, the plan interpreter, and the CLI
//! agree on one wire format.

pub mod condition;
pub mod dataset;
pub mod error;
pub mod plan;
pub mod request;

pub use condition::{Comparator, Condition, Connective, CustomVariable};
pub use dataset::{ColumnKind, ColumnMeta, Dataset};
pub use error::{ModelError, Result};
pub use plan::{AnalysisPlan, AnalysisType, DEFAULT_TEST, DEFAULT_VISUALIZATION};
pub use request::{
    AxisSide, CrosstabRequest, DEFAULT_DECIMAL_PLACES, DEFAULT_SIGNIFICANCE_LEVEL,
    DisplayOptions, MissingPolicy, MultiResponseSpec, SignificanceOptions, StatisticKind,
};
