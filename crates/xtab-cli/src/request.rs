//! Crosstab requests from JSON files and command-line flags.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use xtab_model::{CrosstabRequest, MissingPolicy, StatisticKind};

/// Request settings given as flags. Flags override a request file.
#[derive(Debug, Clone, Default)]
pub struct RequestOverrides {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub weight: Option<String>,
    pub statistics: Vec<String>,
    pub row_pct: bool,
    pub col_pct: bool,
    pub total_pct: bool,
    pub decimal_places: Option<u32>,
    pub include_missing: bool,
    pub hide_empty: bool,
    pub significance: bool,
    pub level: Option<f64>,
    pub continuity_correction: bool,
}

/// Reads a JSON request file.
pub fn read_request(path: &Path) -> Result<CrosstabRequest> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read request file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse request file {}", path.display()))
}

/// Parses statistic names such as `chi-square` or `fisher`.
pub fn parse_statistics(names: &[String]) -> Result<Vec<StatisticKind>> {
    names
        .iter()
        .map(|name| {
            name.parse::<StatisticKind>()
                .with_context(|| format!("unknown statistic '{name}'"))
        })
        .collect()
}

/// Applies `overrides` on top of `base` (or an empty request).
pub fn assemble_request(
    base: Option<CrosstabRequest>,
    overrides: &RequestOverrides,
) -> Result<CrosstabRequest> {
    let mut request = base
        .unwrap_or_else(|| CrosstabRequest::new(Vec::<String>::new(), Vec::<String>::new()));
    if !overrides.rows.is_empty() {
        request.row_vars.clone_from(&overrides.rows);
    }
    if !overrides.cols.is_empty() {
        request.col_vars.clone_from(&overrides.cols);
    }
    if request.row_vars.is_empty() || request.col_vars.is_empty() {
        bail!("a crosstab needs at least one --row and one --col variable (or a --request file)");
    }
    if let Some(weight) = &overrides.weight {
        request.weight = Some(weight.clone());
    }
    for kind in parse_statistics(&overrides.statistics)? {
        if !request.wants(kind) {
            request.statistics.push(kind);
        }
    }
    request.display.row_pct |= overrides.row_pct;
    request.display.col_pct |= overrides.col_pct;
    request.display.total_pct |= overrides.total_pct;
    if let Some(decimals) = overrides.decimal_places {
        request.decimal_places = decimals;
    }
    if overrides.include_missing {
        request.missing = MissingPolicy::Include;
    }
    request.hide_empty |= overrides.hide_empty;
    request.significance.enable |= overrides.significance;
    if let Some(level) = overrides.level {
        request.significance.level = level;
    }
    request.continuity_correction |= overrides.continuity_correction;
    Ok(request)
}
