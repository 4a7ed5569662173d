//! Cross-tabulation and statistical inference for survey datasets.
//!
//! [`compute_crosstab`] turns a [`Dataset`](xtab_model::Dataset) and a
//! [`CrosstabRequest`](xtab_model::CrosstabRequest) into a contingency table,
//! percentage breakdowns, and test results. The stages are also exposed on
//! their own:
//!
//! - [`derive_custom_variables`] / [`evaluate_conditions`]: condition trees
//! - [`expand_multi_response`]: "select all that apply" columns
//! - [`build_crosstab`]: grouping, weighting, and zero pruning
//! - [`compute_statistics`]: chi-square, phi, Cramér's V, Fisher
//! - [`percentages`] / [`format_table`]: output shaping
//!
//! Single-variable summaries live in [`describe`].

pub mod builder;
pub mod category;
pub mod compute;
pub mod derive;
pub mod describe;
pub mod error;
pub mod format;
pub mod multi_response;
pub mod stats;
pub mod table;

pub use builder::{AxisPlan, AxisVariable, BuildOutcome, build_crosstab};
pub use category::{AxisLabel, Category, MISSING_LABEL};
pub use compute::{CrosstabOutcome, compute_crosstab};
pub use derive::{derive_custom_variables, evaluate_conditions};
pub use describe::{
    CategoricalSummary, Distribution, FrequencyEntry, NumericSummary, NumericVariableSummary,
    VariableSummary, describe_variable, frequency_distribution, summarize_numeric_variables,
};
pub use error::{CrosstabError, Result};
pub use format::{
    FormattedTable, PercentageKind, Percentages, format_table, percentages, round_half_away,
};
pub use multi_response::{expand_multi_response, split_selections};
pub use stats::{
    Association, ChiSquareResult, FisherResult, SignificanceBand, StatisticsReport, chi_square,
    compute_statistics, contingency_coefficient, cramers_v, fisher_exact, phi, significance_band,
};
pub use table::ContingencyTable;
