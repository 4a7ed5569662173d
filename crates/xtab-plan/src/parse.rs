//! Descriptor parsing with a fallback plan.
//!
//! Descriptors usually come from a language model, so they may arrive wrapped
//! in Markdown fences, with missing fields, or not as JSON at all. Parsing
//! never fails: anything unusable becomes [`AnalysisPlan::fallback`].

use serde_json::{Map, Value};
use tracing::{debug, warn};
use xtab_model::{AnalysisPlan, AnalysisType, Dataset};

/// Removes a surrounding Markdown code fence (with or without a language tag).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag, if any, up to the end of the opening line.
    let body = match rest.find('\n') {
        Some(newline) if rest[..newline].trim().chars().all(char::is_alphanumeric) => {
            &rest[newline + 1..]
        }
        _ => rest.strip_prefix("json").unwrap_or(rest),
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn read_plan(object: &Map<String, Value>) -> Result<AnalysisPlan, String> {
    let analysis_type = object
        .get("type")
        .ok_or("missing field 'type'")?
        .as_str()
        .ok_or("'type' is not a string")?
        .parse::<AnalysisType>()
        .map_err(|err| err.to_string())?;
    let variables = object
        .get("variables")
        .ok_or("missing field 'variables'")
        .and_then(|value| string_list(value).ok_or("'variables' is not a list of strings"))?;
    if variables.is_empty() {
        return Err("'variables' is empty".to_string());
    }

    let mut plan = AnalysisPlan::new(analysis_type, variables);
    plan.row_vars = object.get("row_vars").and_then(string_list);
    plan.col_vars = object.get("col_vars").and_then(string_list);
    // Non-string test names are dropped here; unknown names are dropped at execution.
    plan.statistical_tests = object
        .get("statistical_tests")
        .and_then(Value::as_array)
        .map(|tests| {
            tests
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    plan.visualization = object
        .get("visualization")
        .or_else(|| object.get("visualization_hint"))
        .and_then(Value::as_str)
        .map(str::to_string);
    Ok(plan)
}

/// Parses a plan descriptor, falling back to a default crosstab of the
/// dataset's first two columns when the descriptor is unusable.
pub fn parse_plan(raw: &str, dataset: &Dataset) -> AnalysisPlan {
    let body = strip_code_fences(raw);
    let parsed = serde_json::from_str::<Value>(body)
        .map_err(|err| format!("not valid JSON: {err}"))
        .and_then(|value| match value {
            Value::Object(object) => read_plan(&object),
            _ => Err("descriptor is not a JSON object".to_string()),
        });

    match parsed {
        Ok(plan) => {
            debug!(
                analysis = %plan.analysis_type,
                variables = plan.variables.len(),
                "analysis plan parsed"
            );
            plan
        }
        Err(reason) => {
            warn!(%reason, "unusable analysis plan, using fallback");
            AnalysisPlan::fallback(&dataset.column_names())
        }
    }
}
