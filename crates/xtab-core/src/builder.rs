//! Crosstab construction.
//!
//! Ordinary variables on an axis form one nested block whose entries are the
//! cartesian product of each variable's observed categories, in sort order.
//! Every option column of a multi-response variable adds one entry of its
//! own, holding the rows that selected that option. One respondent can land
//! in several option entries, so option marginals may exceed the number of
//! respondents.

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::*;
use tracing::{debug, info};
use xtab_common::{any_to_f64, is_missing};
use xtab_model::{ColumnKind, ColumnMeta, Dataset, MissingPolicy};

use crate::category::{AxisLabel, Category};
use crate::error::{CrosstabError, Result};
use crate::table::ContingencyTable;

/// One variable placed on an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisVariable {
    Plain(String),
    /// A multi-response variable already expanded into option columns.
    MultiResponse {
        variable: String,
        option_columns: Vec<String>,
    },
}

impl AxisVariable {
    pub fn name(&self) -> &str {
        match self {
            AxisVariable::Plain(name) => name,
            AxisVariable::MultiResponse { variable, .. } => variable,
        }
    }
}

/// Variables on each axis, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AxisPlan {
    pub rows: Vec<AxisVariable>,
    pub columns: Vec<AxisVariable>,
}

impl AxisPlan {
    /// Plan with ordinary variables only.
    pub fn plain(
        rows: impl IntoIterator<Item = impl Into<String>>,
        columns: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            rows: rows.into_iter().map(|v| AxisVariable::Plain(v.into())).collect(),
            columns: columns
                .into_iter()
                .map(|v| AxisVariable::Plain(v.into()))
                .collect(),
        }
    }
}

/// A built table and whether pruning removed any row or column.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub table: ContingencyTable,
    pub dropped_zero_axes: bool,
}

struct PlainColumn<'a> {
    column: &'a Column,
    kind: ColumnKind,
    meta: Option<&'a ColumnMeta>,
}

struct OptionColumn<'a> {
    name: &'a str,
    column: &'a Column,
}

/// Resolved columns of one axis.
struct AxisReader<'a> {
    names: Vec<String>,
    plain: Vec<PlainColumn<'a>>,
    options: Vec<OptionColumn<'a>>,
}

impl<'a> AxisReader<'a> {
    fn resolve(dataset: &'a Dataset, variables: &'a [AxisVariable]) -> Result<Self> {
        let mut reader = AxisReader {
            names: Vec::with_capacity(variables.len()),
            plain: Vec::new(),
            options: Vec::new(),
        };
        for variable in variables {
            reader.names.push(variable.name().to_string());
            match variable {
                AxisVariable::Plain(name) => reader.plain.push(PlainColumn {
                    column: lookup(dataset, name)?,
                    kind: dataset.kind(name).unwrap_or(ColumnKind::Text),
                    meta: dataset.meta(name),
                }),
                AxisVariable::MultiResponse { option_columns, .. } => {
                    for name in option_columns {
                        reader.options.push(OptionColumn {
                            name,
                            column: lookup(dataset, name)?,
                        });
                    }
                }
            }
        }
        Ok(reader)
    }

    fn categories(&self, idx: usize) -> Vec<Category> {
        self.plain
            .iter()
            .map(|plain| {
                let value = plain.column.get(idx).unwrap_or(AnyValue::Null);
                Category::from_cell(value, plain.kind, plain.meta)
            })
            .collect()
    }

    fn selected_options(&self, idx: usize) -> Vec<usize> {
        self.options
            .iter()
            .enumerate()
            .filter(|(_, option)| {
                any_to_f64(option.column.get(idx).unwrap_or(AnyValue::Null)) == Some(1.0)
            })
            .map(|(pos, _)| pos)
            .collect()
    }
}

fn lookup<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| CrosstabError::column_not_found(name))
}

/// Axis entries: the ordinary block first, then one entry per option column.
struct AxisIndex {
    labels: Vec<AxisLabel>,
    block: BTreeMap<AxisLabel, usize>,
    option_offset: usize,
}

impl AxisIndex {
    fn new(reader: &AxisReader<'_>, observed: &[BTreeSet<Category>]) -> Self {
        let mut labels = if reader.plain.is_empty() {
            Vec::new()
        } else {
            cartesian(observed)
        };
        let block = labels
            .iter()
            .enumerate()
            .map(|(pos, label)| (label.clone(), pos))
            .collect();
        let option_offset = labels.len();
        labels.extend(
            reader
                .options
                .iter()
                .map(|option| AxisLabel::single(Category::Option(option.name.to_string()))),
        );
        Self {
            labels,
            block,
            option_offset,
        }
    }

    fn positions(&self, categories: Vec<Category>, options: &[usize]) -> Vec<usize> {
        let mut positions = Vec::with_capacity(options.len() + 1);
        if !categories.is_empty()
            && let Some(&pos) = self.block.get(&AxisLabel(categories))
        {
            positions.push(pos);
        }
        positions.extend(options.iter().map(|opt| self.option_offset + opt));
        positions
    }
}

fn cartesian(levels: &[BTreeSet<Category>]) -> Vec<AxisLabel> {
    let mut combos: Vec<Vec<Category>> = vec![Vec::new()];
    for level in levels {
        combos = combos
            .into_iter()
            .flat_map(|prefix| {
                level.iter().map(move |category| {
                    let mut combo = prefix.clone();
                    combo.push(category.clone());
                    combo
                })
            })
            .collect();
    }
    combos.into_iter().map(AxisLabel).collect()
}

/// Per-row weights; null weights count as zero.
fn read_weights(dataset: &Dataset, weight: &str) -> Result<Vec<f64>> {
    let column = dataset
        .column(weight)
        .ok_or_else(|| CrosstabError::column_not_found(weight))?;
    if dataset.kind(weight) != Some(ColumnKind::Numeric) {
        return Err(CrosstabError::InvalidWeight {
            column: weight.to_string(),
            message: "weight column is not numeric".to_string(),
        });
    }
    (0..dataset.height())
        .map(|idx| {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            if is_missing(&value) {
                return Ok(0.0);
            }
            match any_to_f64(value) {
                Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
                other => Err(CrosstabError::InvalidWeight {
                    column: weight.to_string(),
                    message: format!(
                        "row {idx} has weight {}",
                        other.map_or_else(|| "non-numeric".to_string(), |w| w.to_string())
                    ),
                }),
            }
        })
        .collect()
}

/// Builds a pruned contingency table.
///
/// - `weight`: cells hold weight sums instead of row counts
/// - `missing`: `Exclude` drops rows with a missing value in any ordinary
///   axis variable; `Include` keeps them as the `Missing` category
/// - `mask`: rows where the mask is false are ignored (subgroup filter)
///
/// All-zero rows and columns are always pruned; a table left without rows or
/// columns is an [`CrosstabError::EmptyTable`].
pub fn build_crosstab(
    dataset: &Dataset,
    plan: &AxisPlan,
    weight: Option<&str>,
    missing: MissingPolicy,
    mask: Option<&[bool]>,
) -> Result<BuildOutcome> {
    if plan.rows.is_empty() || plan.columns.is_empty() {
        return Err(CrosstabError::invalid_request(
            "at least one row and one column variable are required",
        ));
    }
    if let Some(mask) = mask
        && mask.len() != dataset.height()
    {
        return Err(CrosstabError::invalid_request(format!(
            "row mask has {} entries for {} rows",
            mask.len(),
            dataset.height()
        )));
    }
    let rows = AxisReader::resolve(dataset, &plan.rows)?;
    let cols = AxisReader::resolve(dataset, &plan.columns)?;
    let weights = weight.map(|w| read_weights(dataset, w)).transpose()?;

    // (row categories, column categories, weight, row options, column options)
    let mut records = Vec::new();
    let mut excluded = 0usize;
    for idx in 0..dataset.height() {
        if mask.is_some_and(|mask| !mask[idx]) {
            continue;
        }
        let row_categories = rows.categories(idx);
        let col_categories = cols.categories(idx);
        if missing == MissingPolicy::Exclude
            && row_categories
                .iter()
                .chain(&col_categories)
                .any(Category::is_missing)
        {
            excluded += 1;
            continue;
        }
        let w = weights.as_ref().map_or(1.0, |weights| weights[idx]);
        records.push((
            row_categories,
            col_categories,
            w,
            rows.selected_options(idx),
            cols.selected_options(idx),
        ));
    }

    let mut row_levels = vec![BTreeSet::new(); rows.plain.len()];
    let mut col_levels = vec![BTreeSet::new(); cols.plain.len()];
    for (row_categories, col_categories, ..) in &records {
        for (level, category) in row_levels.iter_mut().zip(row_categories) {
            level.insert(category.clone());
        }
        for (level, category) in col_levels.iter_mut().zip(col_categories) {
            level.insert(category.clone());
        }
    }
    let row_index = AxisIndex::new(&rows, &row_levels);
    let col_index = AxisIndex::new(&cols, &col_levels);

    let used = records.len();
    let mut cells = vec![vec![0.0; col_index.labels.len()]; row_index.labels.len()];
    for (row_categories, col_categories, w, row_options, col_options) in records {
        let row_positions = row_index.positions(row_categories, &row_options);
        let col_positions = col_index.positions(col_categories, &col_options);
        for &r in &row_positions {
            for &c in &col_positions {
                cells[r][c] += w;
            }
        }
    }

    let mut table = ContingencyTable::new(
        rows.names,
        cols.names,
        row_index.labels,
        col_index.labels,
        cells,
    )?;
    let before = table.shape();
    let dropped_zero_axes = table.prune_empty();
    debug!(
        used,
        excluded,
        before_rows = before.0,
        before_cols = before.1,
        rows = table.n_rows(),
        cols = table.n_cols(),
        "crosstab built"
    );
    if table.is_empty() {
        return Err(CrosstabError::EmptyTable {
            message: "all combinations have zero frequency after dropping empty rows and columns"
                .to_string(),
        });
    }
    info!(
        rows = table.n_rows(),
        cols = table.n_cols(),
        weighted = weights.is_some(),
        dropped_zero_axes,
        "crosstab ready"
    );
    Ok(BuildOutcome {
        table,
        dropped_zero_axes,
    })
}
