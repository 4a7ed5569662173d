//! Plan execution.
//!
//! Crosstab plans are turned into a [`CrosstabRequest`] and run through
//! [`compute_crosstab`], so plan results and direct requests share one
//! statistics engine.

use serde::Serialize;
use tracing::{info, warn};
use xtab_core::{
    CrosstabOutcome, Distribution, VariableSummary, compute_crosstab, describe_variable,
    frequency_distribution,
};
use xtab_model::{
    AnalysisPlan, AnalysisType, CrosstabRequest, Dataset, DisplayOptions, MissingPolicy,
    SignificanceOptions, StatisticKind,
};

use crate::error::{PlanError, Result};

/// What an executed plan produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanResult {
    Crosstab(Box<CrosstabOutcome>),
    Descriptive {
        variable: String,
        summary: VariableSummary,
    },
    Distribution(Distribution),
}

/// An executed plan with its results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    #[serde(rename = "analysis_plan")]
    pub plan: AnalysisPlan,
    #[serde(rename = "results")]
    pub result: PlanResult,
    /// Suggested chart, when one applies to the result.
    pub visualization: Option<String>,
    /// Test names from the plan that were not recognized.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dropped_tests: Vec<String>,
}

fn require(plan: &AnalysisPlan, needed: usize) -> Result<()> {
    if plan.variables.len() < needed {
        return Err(PlanError::InsufficientVariables {
            analysis: plan.analysis_type,
            needed,
            found: plan.variables.len(),
        });
    }
    Ok(())
}

/// Builds the crosstab request a plan describes.
///
/// Axes come from `row_vars` / `col_vars` when present, else from the first
/// and second variable. Chi-square always runs.
pub fn crosstab_request(plan: &AnalysisPlan) -> Result<(CrosstabRequest, Vec<String>)> {
    let rows = match &plan.row_vars {
        Some(rows) if !rows.is_empty() => rows.clone(),
        _ => {
            require(plan, 1)?;
            vec![plan.variables[0].clone()]
        }
    };
    let cols = match &plan.col_vars {
        Some(cols) if !cols.is_empty() => cols.clone(),
        _ => {
            require(plan, 2)?;
            vec![plan.variables[1].clone()]
        }
    };

    let mut statistics = Vec::new();
    let mut dropped = Vec::new();
    for name in &plan.statistical_tests {
        match name.parse::<StatisticKind>() {
            Ok(kind) if !statistics.contains(&kind) => statistics.push(kind),
            Ok(_) => {}
            Err(_) => {
                warn!(test = %name, "unrecognized statistical test dropped");
                dropped.push(name.clone());
            }
        }
    }

    let request = CrosstabRequest::new(rows, cols)
        .with_statistics(statistics)
        .with_display(DisplayOptions::all())
        .with_significance(SignificanceOptions {
            enable: true,
            ..SignificanceOptions::default()
        });
    Ok((request, dropped))
}

/// Executes `plan` against `dataset`.
pub fn interpret(dataset: &Dataset, plan: &AnalysisPlan) -> Result<PlanOutcome> {
    info!(analysis = %plan.analysis_type, variables = ?plan.variables, "executing analysis plan");
    let mut dropped_tests = Vec::new();
    let (result, visualization) = match plan.analysis_type {
        AnalysisType::Crosstab => {
            let (request, dropped) = crosstab_request(plan)?;
            dropped_tests = dropped;
            let outcome = compute_crosstab(dataset, &request)?;
            (PlanResult::Crosstab(Box::new(outcome)), plan.visualization.clone())
        }
        AnalysisType::Descriptive => {
            require(plan, 1)?;
            let variable = plan.variables[0].clone();
            let summary = describe_variable(dataset, &variable)?;
            // Charts only make sense for numeric summaries.
            let visualization = if summary.is_numeric() {
                plan.visualization.clone()
            } else {
                warn!(%variable, "descriptive summary of a non-numeric variable");
                None
            };
            (PlanResult::Descriptive { variable, summary }, visualization)
        }
        AnalysisType::Distribution => {
            require(plan, 1)?;
            let distribution =
                frequency_distribution(dataset, &plan.variables[0], MissingPolicy::Exclude)?;
            (PlanResult::Distribution(distribution), plan.visualization.clone())
        }
    };
    Ok(PlanOutcome {
        plan: plan.clone(),
        result,
        visualization,
        dropped_tests,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_first_two_variables() {
        let plan = AnalysisPlan::new(AnalysisType::Crosstab, ["gender", "vote", "age"])
            .with_tests(["chi-square", "anova", "phi-cramer", "chi2"]);
        let (request, dropped) = crosstab_request(&plan).unwrap();
        assert_eq!(request.row_vars, vec!["gender"]);
        assert_eq!(request.col_vars, vec!["vote"]);
        assert_eq!(
            request.statistics,
            vec![StatisticKind::ChiSquare, StatisticKind::PhiCramer]
        );
        assert_eq!(dropped, vec!["anova"]);
        assert!(request.needs_chi_square());
    }

    #[test]
    fn explicit_axes_win() {
        let plan = AnalysisPlan::new(AnalysisType::Crosstab, ["a"]).with_axes(["r1", "r2"], ["c"]);
        let (request, _) = crosstab_request(&plan).unwrap();
        assert_eq!(request.row_vars, vec!["r1", "r2"]);
        assert_eq!(request.col_vars, vec!["c"]);
    }

    #[test]
    fn one_variable_is_not_a_crosstab() {
        let plan = AnalysisPlan::new(AnalysisType::Crosstab, ["a"]);
        let err = crosstab_request(&plan).unwrap_err();
        assert!(matches!(
            err,
            PlanError::InsufficientVariables { needed: 2, found: 1, .. }
        ));
        assert_eq!(err.status_code(), 400);
    }
}
