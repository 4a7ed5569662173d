//! Request orchestration: one call from a request to a finished crosstab.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, info_span};
use xtab_model::{AxisSide, CrosstabRequest, Dataset, MultiResponseSpec};

use crate::builder::{AxisPlan, AxisVariable, build_crosstab};
use crate::derive::{derive_custom_variables, evaluate_conditions};
use crate::error::{CrosstabError, Result};
use crate::format::{FormattedTable, PercentageKind, Percentages, format_table, percentages};
use crate::multi_response::expand_multi_response;
use crate::stats::{StatisticsReport, compute_statistics};
use crate::table::ContingencyTable;

/// Result of [`compute_crosstab`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrosstabOutcome {
    /// Counts (or weight sums), rounded.
    pub table: FormattedTable,
    pub percentages: Percentages,
    #[serde(rename = "stats")]
    pub statistics: StatisticsReport,
    #[serde(rename = "dropped_zero_rows_cols")]
    pub dropped_zero_axes: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub multiple_response: BTreeMap<String, MultiResponseSpec>,
    /// Unrounded table the statistics were computed on.
    #[serde(skip)]
    pub counts: ContingencyTable,
}

fn validate(request: &CrosstabRequest) -> Result<()> {
    if request.row_vars.is_empty() || request.col_vars.is_empty() {
        return Err(CrosstabError::invalid_request(
            "at least one row and one column variable are required",
        ));
    }
    let level = request.significance.level;
    if !(level > 0.0 && level < 1.0) {
        return Err(CrosstabError::invalid_request(format!(
            "significance level must be between 0 and 1, got {level}"
        )));
    }
    for (variable, spec) in &request.multiple_response {
        let conflicting = match spec.axis {
            AxisSide::Row => &request.col_vars,
            AxisSide::Column => &request.row_vars,
        };
        if conflicting.contains(variable) {
            return Err(CrosstabError::invalid_request(format!(
                "multi-response variable '{variable}' is tagged for the {} axis but listed on the other",
                spec.axis
            )));
        }
    }
    Ok(())
}

fn check_columns<'a>(dataset: &Dataset, names: impl IntoIterator<Item = &'a String>) -> Result<()> {
    names.into_iter().try_for_each(|name| {
        if dataset.has_column(name) {
            Ok(())
        } else {
            Err(CrosstabError::column_not_found(name))
        }
    })
}

/// Expands every multi-response variable and places it on its tagged axis.
fn assemble_axes(
    mut working: Dataset,
    request: &CrosstabRequest,
) -> Result<(Dataset, AxisPlan)> {
    let mut expanded: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for (variable, spec) in &request.multiple_response {
        let (next, columns) = expand_multi_response(&working, variable, &spec.options)?;
        working = next;
        expanded.insert(variable.as_str(), columns);
    }

    let place = |variable: &String| match expanded.get(variable.as_str()) {
        Some(columns) => AxisVariable::MultiResponse {
            variable: variable.clone(),
            option_columns: columns.clone(),
        },
        None => AxisVariable::Plain(variable.clone()),
    };
    let mut plan = AxisPlan {
        rows: request.row_vars.iter().map(place).collect(),
        columns: request.col_vars.iter().map(place).collect(),
    };

    // Variables only declared in `multiple_response` join their tagged axis.
    for (variable, spec) in &request.multiple_response {
        if request.row_vars.contains(variable) || request.col_vars.contains(variable) {
            continue;
        }
        let axis = match spec.axis {
            AxisSide::Row => &mut plan.rows,
            AxisSide::Column => &mut plan.columns,
        };
        axis.push(place(variable));
    }
    Ok((working, plan))
}

/// Drops rows and columns that are empty in `counts` from every table.
fn hide_empty(counts: &mut ContingencyTable, tables: &mut [&mut ContingencyTable]) -> bool {
    let (rows, cols) = counts.non_empty_indices();
    if rows.len() == counts.n_rows() && cols.len() == counts.n_cols() {
        return false;
    }
    *counts = counts.select(&rows, &cols);
    for table in tables.iter_mut() {
        **table = table.select(&rows, &cols);
    }
    true
}

/// Computes a crosstab end to end.
///
/// Stages run in order: validation, custom variable derivation, subgroup
/// filtering, multi-response expansion, construction, percentages, optional
/// hiding of empty axes, statistics, formatting. The caller's dataset is
/// never modified.
pub fn compute_crosstab(dataset: &Dataset, request: &CrosstabRequest) -> Result<CrosstabOutcome> {
    let span = info_span!(
        "crosstab",
        rows = ?request.row_vars,
        cols = ?request.col_vars,
        weighted = request.weight.is_some()
    );
    let _guard = span.enter();

    validate(request)?;
    let working = derive_custom_variables(dataset, &request.custom_variables)?;

    let plain_axis_vars = request
        .row_vars
        .iter()
        .chain(&request.col_vars)
        .filter(|name| !request.multiple_response.contains_key(*name));
    check_columns(&working, plain_axis_vars)?;
    check_columns(&working, request.multiple_response.keys())?;
    check_columns(&working, request.weight.iter())?;

    let mask = if request.filter.is_empty() {
        None
    } else {
        let mask = evaluate_conditions(&working, &request.filter)?;
        debug!(
            kept = mask.iter().filter(|&&keep| keep).count(),
            total = mask.len(),
            "subgroup filter applied"
        );
        Some(mask)
    };

    let (working, plan) = assemble_axes(working, request)?;
    let built = build_crosstab(
        &working,
        &plan,
        request.weight.as_deref(),
        request.missing,
        mask.as_deref(),
    )?;
    let mut counts = built.table;
    let mut dropped_zero_axes = built.dropped_zero_axes;

    let display = request.display;
    let mut pct_tables: Vec<(PercentageKind, ContingencyTable)> = [
        (PercentageKind::Row, display.row_pct),
        (PercentageKind::Column, display.col_pct),
        (PercentageKind::Total, display.total_pct),
    ]
    .into_iter()
    .filter(|(_, wanted)| *wanted)
    .map(|(kind, _)| (kind, percentages(&counts, kind)))
    .collect();

    if request.hide_empty {
        let mut views: Vec<&mut ContingencyTable> =
            pct_tables.iter_mut().map(|(_, table)| table).collect();
        dropped_zero_axes |= hide_empty(&mut counts, &mut views);
        if counts.is_empty() {
            return Err(CrosstabError::EmptyTable {
                message: "no rows or columns left after hiding empty ones".to_string(),
            });
        }
    }

    let statistics = compute_statistics(&counts, request)?;

    let decimals = request.decimal_places;
    let mut formatted = Percentages::default();
    for (kind, table) in &pct_tables {
        let slot = match kind {
            PercentageKind::Row => &mut formatted.row_pct,
            PercentageKind::Column => &mut formatted.col_pct,
            PercentageKind::Total => &mut formatted.total_pct,
        };
        *slot = Some(format_table(table, decimals));
    }

    info!(
        rows = counts.n_rows(),
        cols = counts.n_cols(),
        percentages = pct_tables.len(),
        chi_square = statistics.chi_square.is_some(),
        fisher = statistics.fisher.is_some(),
        "crosstab computed"
    );
    Ok(CrosstabOutcome {
        table: format_table(&counts, decimals),
        percentages: formatted,
        statistics,
        dropped_zero_axes,
        multiple_response: request.multiple_response.clone(),
        counts,
    })
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;
    use xtab_model::{Comparator, Condition, CustomVariable, DisplayOptions, StatisticKind};

    use super::*;
    use crate::category::{AxisLabel, Category};

    fn survey() -> Dataset {
        let frame = DataFrame::new(vec![
            Column::new("gender".into(), ["M", "F", "M", "F"]),
            Column::new("vote".into(), ["Y", "N", "Y", "Y"]),
            Column::new("age".into(), [17i64, 22, 40, 35]),
            Column::new("brands".into(), ["A,B", "A", "B", "C"]),
        ])
        .unwrap();
        Dataset::new(frame)
    }

    #[test]
    fn rejects_empty_axes_and_bad_level() {
        let err = compute_crosstab(&survey(), &CrosstabRequest::new(["gender"], Vec::<String>::new()))
            .unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidRequest { .. }));

        let request = CrosstabRequest::new(["gender"], ["vote"]).with_significance(
            xtab_model::SignificanceOptions {
                enable: true,
                level: 1.5,
            },
        );
        assert!(compute_crosstab(&survey(), &request).is_err());
    }

    #[test]
    fn multi_response_on_the_wrong_axis() {
        let request = CrosstabRequest::new(["gender"], ["brands"])
            .with_multi_response("brands", MultiResponseSpec::new(AxisSide::Row, ["A", "B"]));
        let err = compute_crosstab(&survey(), &request).unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidRequest { .. }));
    }

    #[test]
    fn undeclared_multi_response_joins_tagged_axis() {
        let request = CrosstabRequest::new(["gender"], ["vote"])
            .with_multi_response("brands", MultiResponseSpec::new(AxisSide::Row, ["A", "B"]));
        let outcome = compute_crosstab(&survey(), &request).unwrap();
        let rows: Vec<&str> = outcome.table.row_keys().collect();
        assert_eq!(rows, vec!["F", "M", "brands_A", "brands_B"]);
        assert_eq!(outcome.counts.row_axis(), &["gender".to_string(), "brands".to_string()]);
    }

    #[test]
    fn custom_variable_usable_in_filter_and_axes() {
        let request = CrosstabRequest::new(["adult"], ["vote"])
            .with_custom_variable(CustomVariable::new(
                "adult",
                vec![Condition::new("age", Comparator::GreaterThan, "18")],
            ))
            .with_filter(vec![Condition::new("gender", Comparator::Equals, "F")])
            .with_display(DisplayOptions::all());
        let outcome = compute_crosstab(&survey(), &request).unwrap();
        assert_eq!(outcome.counts.cells(), &[vec![1.0, 1.0]]);
        assert_eq!(outcome.percentages.row_pct.as_ref().unwrap().value("1", "N"), Some(50.0));
    }

    #[test]
    fn statistics_follow_request() {
        let request = CrosstabRequest::new(["gender"], ["vote"])
            .with_statistics([StatisticKind::PhiCramer, StatisticKind::Fisher]);
        let outcome = compute_crosstab(&survey(), &request).unwrap();
        let stats = &outcome.statistics;
        assert!(stats.chi_square.is_some());
        assert!(stats.association.is_some_and(|a| a.phi.is_some()));
        assert!(stats.contingency_coefficient.is_none());
        assert!(stats.fisher.is_some());
    }

    #[test]
    fn unknown_columns_are_reported() {
        let err = compute_crosstab(&survey(), &CrosstabRequest::new(["gender"], ["income"]))
            .unwrap_err();
        assert!(matches!(err, CrosstabError::ColumnNotFound { ref column } if column == "income"));
    }

    #[test]
    fn hide_empty_drops_the_same_axes_everywhere() {
        let label = |s: &str| AxisLabel::single(Category::Text(s.to_string()));
        let table = |cells: Vec<Vec<f64>>| {
            ContingencyTable::new(
                vec!["q".into()],
                vec!["r".into()],
                vec![label("a"), label("b")],
                vec![label("x"), label("y")],
                cells,
            )
            .unwrap()
        };
        let mut counts = table(vec![vec![0.0, 0.0], vec![3.0, 0.0]]);
        let mut pct = table(vec![vec![0.0, 0.0], vec![100.0, 0.0]]);

        assert!(hide_empty(&mut counts, &mut [&mut pct]));
        assert_eq!(counts.cells(), &[vec![3.0]]);
        assert_eq!(pct.cells(), &[vec![100.0]]);
        assert_eq!(pct.row_labels(), &[label("b")]);
        assert_eq!(pct.column_labels(), &[label("x")]);

        assert!(!hide_empty(&mut counts, &mut [&mut pct]));
    }
}
