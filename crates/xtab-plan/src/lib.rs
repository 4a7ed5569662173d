//! Analysis plan interpreter.
//!
//! Turns a plan descriptor (usually an assistant's JSON reply) into results
//! and a short explanation:
//!
//! 1. [`parse_plan`]: strip fences, parse, or fall back to a default plan
//! 2. [`interpret`]: run the plan through the crosstab engine or `describe`
//! 3. [`explain`]: fill the explanation template
//!
//! [`respond`] chains all three.

mod error;
mod execute;
mod explain;
mod parse;

use serde::Serialize;
use xtab_model::Dataset;

pub use error::{PlanError, Result};
pub use execute::{PlanOutcome, PlanResult, crosstab_request, interpret};
pub use explain::explain;
pub use parse::{parse_plan, strip_code_fences};

/// A plan's outcome together with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub outcome: PlanOutcome,
    pub explanation: String,
}

/// Parses `raw`, executes the resulting plan, and explains it.
pub fn respond(raw: &str, dataset: &Dataset) -> Result<AnalysisResponse> {
    let plan = parse_plan(raw, dataset);
    let outcome = interpret(dataset, &plan)?;
    let explanation = explain(&outcome);
    Ok(AnalysisResponse {
        outcome,
        explanation,
    })
}
