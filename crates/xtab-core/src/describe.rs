//! Single-variable summaries: descriptive statistics and frequency tables.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;
use xtab_common::any_to_f64;
use xtab_model::{ColumnKind, Dataset, MissingPolicy};

use crate::category::Category;
use crate::error::{CrosstabError, Result};

/// Summary of a numeric variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation; `None` below two observations.
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q1: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub missing: usize,
}

/// Summary of a text or date variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalSummary {
    pub count: usize,
    pub unique: usize,
    /// Most frequent value; ties go to the first in sort order.
    pub top: Option<Category>,
    pub freq: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VariableSummary {
    Numeric(NumericSummary),
    Categorical(CategoricalSummary),
}

impl VariableSummary {
    pub fn is_numeric(&self) -> bool {
        matches!(self, VariableSummary::Numeric(_))
    }
}

/// One category of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyEntry {
    pub category: Category,
    /// Value label when the loader supplied one, else the category text.
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Ordered category counts of one variable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub variable: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub entries: Vec<FrequencyEntry>,
    /// Number of counted rows; the base of `percent`.
    pub total: usize,
    pub missing: usize,
}

impl Distribution {
    /// The most frequent entry; ties go to the first in sort order.
    pub fn modal(&self) -> Option<&FrequencyEntry> {
        self.entries
            .iter()
            .fold(None, |best: Option<&FrequencyEntry>, entry| match best {
                Some(best) if best.count >= entry.count => Some(best),
                _ => Some(entry),
            })
    }
}

/// Compact summary of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericVariableSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub missing: usize,
}

/// Categories of every row, in row order.
fn categories(dataset: &Dataset, name: &str) -> Result<Vec<Category>> {
    let column = dataset
        .column(name)
        .ok_or_else(|| CrosstabError::column_not_found(name))?;
    let kind = dataset.kind(name).unwrap_or(ColumnKind::Text);
    let meta = dataset.meta(name);
    Ok((0..dataset.height())
        .map(|idx| Category::from_cell(column.get(idx).unwrap_or(AnyValue::Null), kind, meta))
        .collect())
}

fn numeric_values(dataset: &Dataset, name: &str) -> Result<(Vec<f64>, usize)> {
    let mut values = Vec::new();
    let mut missing = 0;
    for category in categories(dataset, name)? {
        match category {
            Category::Number(v) => values.push(v),
            Category::Missing => missing += 1,
            Category::Text(text) | Category::Option(text) => {
                match any_to_f64(AnyValue::String(&text)) {
                    Some(v) if v.is_finite() => values.push(v),
                    _ => missing += 1,
                }
            }
        }
    }
    Ok((values, missing))
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile of sorted values with linear interpolation.
fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = p * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

fn summarize_numbers(mut values: Vec<f64>, missing: usize) -> NumericSummary {
    values.sort_by(f64::total_cmp);
    NumericSummary {
        count: values.len(),
        mean: mean(&values),
        std: sample_std(&values),
        min: values.first().copied(),
        q1: quantile(&values, 0.25),
        median: quantile(&values, 0.5),
        q3: quantile(&values, 0.75),
        max: values.last().copied(),
        missing,
    }
}

/// Descriptive statistics for one variable, chosen by its column kind.
pub fn describe_variable(dataset: &Dataset, name: &str) -> Result<VariableSummary> {
    if dataset.kind(name) == Some(ColumnKind::Numeric) {
        let (values, missing) = numeric_values(dataset, name)?;
        debug!(variable = name, count = values.len(), missing, "numeric summary");
        return Ok(VariableSummary::Numeric(summarize_numbers(values, missing)));
    }

    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    let mut missing = 0;
    for category in categories(dataset, name)? {
        if category.is_missing() {
            missing += 1;
        } else {
            *counts.entry(category).or_default() += 1;
        }
    }
    let mut top: Option<(&Category, usize)> = None;
    for (category, &count) in &counts {
        if top.is_none_or(|(_, best)| count > best) {
            top = Some((category, count));
        }
    }
    debug!(variable = name, unique = counts.len(), missing, "categorical summary");
    Ok(VariableSummary::Categorical(CategoricalSummary {
        count: counts.values().sum(),
        unique: counts.len(),
        top: top.map(|(category, _)| category.clone()),
        freq: top.map_or(0, |(_, count)| count),
        missing,
    }))
}

/// Ordered category counts for one variable.
///
/// With [`MissingPolicy::Include`] missing values form a trailing `Missing`
/// entry and count toward the total; otherwise they are only reported in
/// `missing`.
pub fn frequency_distribution(
    dataset: &Dataset,
    name: &str,
    missing: MissingPolicy,
) -> Result<Distribution> {
    let mut counts: BTreeMap<Category, usize> = BTreeMap::new();
    let mut missing_count = 0;
    for category in categories(dataset, name)? {
        if category.is_missing() {
            missing_count += 1;
            if missing == MissingPolicy::Exclude {
                continue;
            }
        }
        *counts.entry(category).or_default() += 1;
    }

    let meta = dataset.meta(name);
    let total: usize = counts.values().sum();
    let entries = counts
        .into_iter()
        .map(|(category, count)| {
            let text = category.to_string();
            let label = meta
                .and_then(|meta| meta.value_labels.get(&text))
                .cloned()
                .unwrap_or(text);
            FrequencyEntry {
                category,
                label,
                count,
                percent: if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                },
            }
        })
        .collect();
    Ok(Distribution {
        variable: name.to_string(),
        label: meta.and_then(|meta| meta.label.clone()),
        entries,
        total,
        missing: missing_count,
    })
}

/// Min, max, mean, std, and missing count for every numeric column.
pub fn summarize_numeric_variables(dataset: &Dataset) -> Result<Vec<NumericVariableSummary>> {
    dataset
        .column_names()
        .into_iter()
        .filter(|name| dataset.kind(name) == Some(ColumnKind::Numeric))
        .map(|name| {
            let (values, missing) = numeric_values(dataset, &name)?;
            let summary = summarize_numbers(values, missing);
            Ok(NumericVariableSummary {
                label: dataset.meta(&name).and_then(|meta| meta.label.clone()),
                name,
                min: summary.min,
                max: summary.max,
                mean: summary.mean,
                std: summary.std,
                missing,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use xtab_model::ColumnMeta;

    use super::*;

    fn survey() -> Dataset {
        let frame = DataFrame::new(vec![
            Column::new("age".into(), [Some(20.0f64), Some(30.0), None, Some(40.0), Some(50.0)]),
            Column::new("city".into(), [Some("b"), Some("a"), Some("b"), None, Some("a")]),
            Column::new("q1".into(), [1i64, 2, 2, 9, 1]),
        ])
        .unwrap();
        let mut meta = BTreeMap::new();
        meta.insert(
            "q1".to_string(),
            ColumnMeta::new(ColumnKind::Numeric)
                .with_label("Satisfaction")
                .with_value_label("1", "Low")
                .with_value_label("2", "High")
                .with_missing_values(["9"]),
        );
        Dataset::with_metadata(frame, meta)
    }

    #[test]
    fn numeric_summary_matches_describe() {
        let VariableSummary::Numeric(summary) = describe_variable(&survey(), "age").unwrap() else {
            panic!("expected numeric summary");
        };
        assert_eq!(summary.count, 4);
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.mean, Some(35.0));
        assert!((summary.std.unwrap() - 12.909_944).abs() < 1e-6);
        assert_eq!(summary.q1, Some(27.5));
        assert_eq!(summary.median, Some(35.0));
        assert_eq!(summary.q3, Some(42.5));
        assert_eq!(summary.max, Some(50.0));
    }

    #[test]
    fn categorical_summary_breaks_ties_by_order() {
        let VariableSummary::Categorical(summary) = describe_variable(&survey(), "city").unwrap()
        else {
            panic!("expected categorical summary");
        };
        assert_eq!(summary.count, 4);
        assert_eq!(summary.unique, 2);
        assert_eq!(summary.top, Some(Category::Text("a".into())));
        assert_eq!(summary.freq, 2);
        assert_eq!(summary.missing, 1);
    }

    #[test]
    fn distribution_uses_value_labels_and_missing_codes() {
        let dataset = survey();
        let excluded = frequency_distribution(&dataset, "q1", MissingPolicy::Exclude).unwrap();
        let labels: Vec<&str> = excluded.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Low", "High"]);
        assert_eq!(excluded.total, 4);
        assert_eq!(excluded.missing, 1);
        assert_eq!(excluded.entries[0].percent, 50.0);
        assert_eq!(excluded.label.as_deref(), Some("Satisfaction"));

        let included = frequency_distribution(&dataset, "q1", MissingPolicy::Include).unwrap();
        assert_eq!(included.total, 5);
        assert_eq!(included.entries.last().unwrap().label, "Missing");
        assert_eq!(included.modal().unwrap().label, "Low");
    }

    #[test]
    fn numeric_variables_summarized() {
        let summaries = summarize_numeric_variables(&survey()).unwrap();
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["age", "q1"]);
        assert_eq!(summaries[1].max, Some(2.0));
        assert_eq!(summaries[1].missing, 1);
    }

    #[test]
    fn unknown_variable() {
        assert!(matches!(
            describe_variable(&survey(), "income"),
            Err(CrosstabError::ColumnNotFound { .. })
        ));
    }
}
