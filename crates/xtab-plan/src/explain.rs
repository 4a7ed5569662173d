//! Template explanations of executed plans.

use std::fmt::Write;

use xtab_core::{CategoricalSummary, CrosstabOutcome, Distribution, NumericSummary, VariableSummary};

use crate::execute::{PlanOutcome, PlanResult};

const VISUALIZATION_HINT: &str = "Click the \"View Visualization\" button to see the detailed results.";

fn two_decimals(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn explain_crosstab(outcome: &CrosstabOutcome) -> String {
    let rows = outcome.table.row_axis().join(", ");
    let cols = outcome.table.column_axis().join(", ");
    let mut text = format!(
        "I've analyzed the relationship between {rows} and {cols}. Here's what I found:\n\n\
         The cross-tabulation shows the distribution of values across the categories.\n"
    );
    let stats = &outcome.statistics;
    if let Some(chi) = &stats.chi_square {
        let wording = if chi.significance.is_significant() {
            "statistically significant"
        } else {
            "not statistically significant"
        };
        let _ = write!(
            text,
            "The chi-square test results indicate that the relationship is {wording}:\n\
             - Chi-square statistic: {:.2}\n\
             - P-value: {:.4}\n\
             - Degrees of freedom: {}\n",
            chi.statistic, chi.p_value, chi.dof
        );
    }
    if let Some(association) = &stats.association {
        if let Some(phi) = association.phi {
            let _ = writeln!(text, "- Phi: {phi:.2}");
        }
        if let Some(v) = association.cramers_v {
            let _ = writeln!(text, "- Cramér's V: {v:.2}");
        }
    }
    if let Some(c) = stats.contingency_coefficient {
        let _ = writeln!(text, "- Contingency coefficient: {c:.2}");
    }
    if let Some(fisher) = &stats.fisher {
        let _ = writeln!(text, "- Fisher's exact p-value: {:.4}", fisher.p_value);
    }
    text
}

fn explain_numeric(variable: &str, summary: &NumericSummary) -> String {
    format!(
        "I've analyzed the descriptive statistics for {variable}. Here's what I found:\n\n\
         - Mean: {}\n\
         - Standard Deviation: {}\n\
         - Minimum: {}\n\
         - Maximum: {}\n",
        two_decimals(summary.mean),
        two_decimals(summary.std),
        two_decimals(summary.min),
        two_decimals(summary.max),
    )
}

fn explain_categorical(variable: &str, summary: &CategoricalSummary) -> String {
    let top = summary
        .top
        .as_ref()
        .map_or_else(|| "n/a".to_string(), ToString::to_string);
    format!(
        "I've analyzed the descriptive statistics for {variable}. Here's what I found:\n\n\
         - Count: {}\n\
         - Unique: {}\n\
         - Most common value: {top}\n\
         - Frequency of most common: {}\n",
        summary.count, summary.unique, summary.freq
    )
}

fn explain_distribution(distribution: &Distribution) -> String {
    let name = distribution
        .label
        .as_deref()
        .unwrap_or(&distribution.variable);
    match distribution.modal() {
        Some(modal) => format!(
            "I've analyzed the distribution of {name} across {} categories.\n\n\
             The most common category is {} with {} of {} responses ({:.1}%).\n",
            distribution.entries.len(),
            modal.label,
            modal.count,
            distribution.total,
            modal.percent
        ),
        None => format!("{name} has no non-missing responses.\n"),
    }
}

/// Natural-language explanation of an executed plan.
pub fn explain(outcome: &PlanOutcome) -> String {
    let mut text = match &outcome.result {
        PlanResult::Crosstab(crosstab) => explain_crosstab(crosstab),
        PlanResult::Descriptive { variable, summary } => match summary {
            VariableSummary::Numeric(numeric) => explain_numeric(variable, numeric),
            VariableSummary::Categorical(categorical) => explain_categorical(variable, categorical),
        },
        PlanResult::Distribution(distribution) => explain_distribution(distribution),
    };
    if outcome.visualization.is_some() {
        text.push('\n');
        text.push_str(VISUALIZATION_HINT);
        text.push('\n');
    }
    text
}
