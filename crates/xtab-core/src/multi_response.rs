//! Multi-response ("select all that apply") expansion.

use polars::prelude::*;
use tracing::debug;
use xtab_common::{any_to_string, is_missing};
use xtab_model::{ColumnKind, ColumnMeta, Dataset, MultiResponseSpec};

use crate::error::{CrosstabError, Result};

/// Splits a raw cell into trimmed, non-empty selections.
pub fn split_selections(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|token| !token.is_empty())
}

/// Adds one 0/1 `Int32` column per option, named `{variable}_{option}`.
///
/// A row gets 1 for an option when the option label is one of the
/// comma-separated tokens of its raw value. Missing raw values give 0 for
/// every option. Returns the working copy and the derived names in option
/// order.
pub fn expand_multi_response(
    dataset: &Dataset,
    variable: &str,
    options: &[String],
) -> Result<(Dataset, Vec<String>)> {
    let column = dataset
        .column(variable)
        .ok_or_else(|| CrosstabError::column_not_found(variable))?;
    if options.is_empty() {
        return Err(CrosstabError::invalid_request(format!(
            "multi-response variable '{variable}' has no options"
        )));
    }
    let meta = dataset.meta(variable);

    let selections: Vec<Vec<String>> = (0..dataset.height())
        .map(|idx| {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            if is_missing(&value) {
                return Vec::new();
            }
            let raw = any_to_string(value);
            if meta.is_some_and(|meta| meta.is_missing_code(&raw)) {
                return Vec::new();
            }
            split_selections(&raw).map(str::to_string).collect()
        })
        .collect();

    let mut working = dataset.working_copy();
    let mut names = Vec::with_capacity(options.len());
    for option in options {
        let name = MultiResponseSpec::option_column(variable, option);
        let values: Vec<i32> = selections
            .iter()
            .map(|tokens| i32::from(tokens.iter().any(|token| token == option)))
            .collect();
        let option_meta = ColumnMeta::new(ColumnKind::Numeric).with_label(option.clone());
        working.put_column(Series::new(name.as_str().into(), values), option_meta)?;
        names.push(name);
    }
    debug!(variable, options = options.len(), "multi-response expanded");
    Ok((working, names))
}
