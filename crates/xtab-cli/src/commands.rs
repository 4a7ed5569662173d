use std::fs;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::AnyValue;
use serde::Serialize;
use tracing::{info_span, trace};

use xtab_cli::logging::{log_data_enabled, redact_value};
use xtab_cli::request::{assemble_request, read_request};
use xtab_common::any_to_string;
use xtab_core::{
    CrosstabOutcome, Distribution, NumericVariableSummary, VariableSummary, compute_crosstab,
    describe_variable, frequency_distribution, summarize_numeric_variables,
};
use xtab_ingest::{CsvLoader, LoaderRegistry};
use xtab_model::{ColumnKind, Dataset, MissingPolicy};
use xtab_plan::{AnalysisResponse, respond};

use crate::cli::{CrosstabArgs, DataArgs, DescribeArgs, PlanArgs};

/// Number of respondents echoed at trace level with `--log-data`.
const TRACE_SAMPLE_ROWS: usize = 5;

/// What a command produced, rendered by `summary` or as JSON.
pub enum CommandOutput {
    Crosstab(Box<CrosstabOutcome>),
    Plan(Box<AnalysisResponse>),
    Variable {
        variable: String,
        summary: VariableSummary,
        distribution: Option<Distribution>,
    },
    NumericVariables(Vec<NumericVariableSummary>),
}

#[derive(Serialize)]
struct VariableReport<'a> {
    variable: &'a str,
    summary: &'a VariableSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    distribution: Option<&'a Distribution>,
}

impl CommandOutput {
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            CommandOutput::Crosstab(outcome) => serde_json::to_string_pretty(outcome),
            CommandOutput::Plan(response) => serde_json::to_string_pretty(response),
            CommandOutput::Variable {
                variable,
                summary,
                distribution,
            } => serde_json::to_string_pretty(&VariableReport {
                variable,
                summary,
                distribution: distribution.as_ref(),
            }),
            CommandOutput::NumericVariables(summaries) => serde_json::to_string_pretty(summaries),
        };
        json.context("serialize output")
    }
}

fn load_dataset(args: &DataArgs) -> Result<Dataset> {
    let mut registry = LoaderRegistry::with_defaults();
    if args.label_row {
        registry.register(Box::new(CsvLoader::new().with_label_row()));
    }
    registry
        .load(&args.data)
        .with_context(|| format!("load {}", args.data.display()))
}

fn trace_sample(dataset: &Dataset, variables: &[String]) {
    if !log_data_enabled() {
        return;
    }
    for idx in 0..dataset.height().min(TRACE_SAMPLE_ROWS) {
        for variable in variables {
            if let Some(column) = dataset.column(variable) {
                let value = any_to_string(column.get(idx).unwrap_or(AnyValue::Null));
                trace!(row = idx, %variable, value = redact_value(&value), "respondent value");
            }
        }
    }
}

pub fn run_crosstab(args: &CrosstabArgs) -> Result<CommandOutput> {
    let base = args.request.as_deref().map(read_request).transpose()?;
    let request = assemble_request(base, &args.overrides())?;
    let span = info_span!("crosstab_command", data = %args.data.data.display());
    let _guard = span.enter();

    let dataset = load_dataset(&args.data)?;
    let axis_vars: Vec<String> = request
        .row_vars
        .iter()
        .chain(&request.col_vars)
        .cloned()
        .collect();
    trace_sample(&dataset, &axis_vars);

    let outcome = compute_crosstab(&dataset, &request)?;
    Ok(CommandOutput::Crosstab(Box::new(outcome)))
}

fn read_descriptor(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        return io::read_to_string(io::stdin()).context("read plan from stdin");
    }
    fs::read_to_string(path).with_context(|| format!("read plan file {}", path.display()))
}

pub fn run_plan(args: &PlanArgs) -> Result<CommandOutput> {
    let raw = read_descriptor(&args.plan)?;
    let dataset = load_dataset(&args.data)?;
    let response = respond(&raw, &dataset)?;
    trace_sample(&dataset, &response.outcome.plan.variables);
    Ok(CommandOutput::Plan(Box::new(response)))
}

pub fn run_describe(args: &DescribeArgs) -> Result<CommandOutput> {
    let dataset = load_dataset(&args.data)?;
    let Some(variable) = &args.variable else {
        let summaries = summarize_numeric_variables(&dataset)?;
        return Ok(CommandOutput::NumericVariables(summaries));
    };
    trace_sample(&dataset, std::slice::from_ref(variable));
    let summary = describe_variable(&dataset, variable)?;
    let distribution = match dataset.kind(variable) {
        Some(ColumnKind::Numeric) => None,
        _ => Some(frequency_distribution(
            &dataset,
            variable,
            MissingPolicy::Include,
        )?),
    };
    Ok(CommandOutput::Variable {
        variable: variable.clone(),
        summary,
        distribution,
    })
}
