//! Custom variable derivation.
//!
//! Each condition is compiled once into a [`Predicate`] for its column's
//! resolved kind, then evaluated row by row. Conditions fold left to right.

use polars::prelude::*;
use tracing::{debug, info};
use xtab_common::{any_to_f64, any_to_string, is_missing, parse_f64};
use xtab_model::{
    ColumnKind, ColumnMeta, Comparator, Condition, Connective, CustomVariable, Dataset,
};

use crate::error::{CrosstabError, Result};

/// A comparator bound to its literal.
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// Numeric equality; `None` when the literal is not a number.
    EqualsNumber(Option<f64>),
    EqualsText(String),
    /// Lowercased needle.
    Contains(String),
    GreaterThan(f64),
    LessThan(f64),
}

impl Predicate {
    fn compile(condition: &Condition, kind: ColumnKind) -> Result<Self> {
        let literal = condition.value.as_str();
        match condition.comparator {
            Comparator::Equals => Ok(match kind {
                ColumnKind::Numeric => Predicate::EqualsNumber(parse_f64(literal)),
                ColumnKind::Text | ColumnKind::Temporal => {
                    Predicate::EqualsText(literal.to_string())
                }
            }),
            Comparator::Contains => Ok(Predicate::Contains(literal.to_lowercase())),
            Comparator::GreaterThan => numeric_literal(condition).map(Predicate::GreaterThan),
            Comparator::LessThan => numeric_literal(condition).map(Predicate::LessThan),
        }
    }

    fn matches(&self, value: AnyValue<'_>) -> bool {
        match self {
            Predicate::EqualsNumber(None) => false,
            Predicate::EqualsNumber(Some(expected)) => any_to_f64(value) == Some(*expected),
            Predicate::EqualsText(expected) => any_to_string(value) == *expected,
            Predicate::Contains(needle) => any_to_string(value).to_lowercase().contains(needle),
            Predicate::GreaterThan(bound) => any_to_f64(value).is_some_and(|v| v > *bound),
            Predicate::LessThan(bound) => any_to_f64(value).is_some_and(|v| v < *bound),
        }
    }
}

fn numeric_literal(condition: &Condition) -> Result<f64> {
    parse_f64(&condition.value)
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            CrosstabError::invalid_condition(format!(
                "{} on '{}' needs a numeric value, got '{}'",
                condition.comparator, condition.column, condition.value
            ))
        })
}

fn evaluate_condition(dataset: &Dataset, condition: &Condition) -> Result<Vec<bool>> {
    let column = dataset
        .column(&condition.column)
        .ok_or_else(|| CrosstabError::column_not_found(&condition.column))?;
    let kind = dataset.kind(&condition.column).unwrap_or(ColumnKind::Text);
    let meta = dataset.meta(&condition.column);
    let predicate = Predicate::compile(condition, kind)?;

    let mask = (0..dataset.height())
        .map(|idx| {
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            if is_missing(&value) {
                return false;
            }
            if meta.is_some_and(|meta| meta.is_missing_code(&any_to_string(value.clone()))) {
                return false;
            }
            predicate.matches(value)
        })
        .collect();
    Ok(mask)
}

/// Evaluates an ordered condition list to a row mask.
///
/// The first condition seeds the mask; every later one is joined with its
/// own `operator`. Nulls never satisfy a condition.
pub fn evaluate_conditions(dataset: &Dataset, conditions: &[Condition]) -> Result<Vec<bool>> {
    let (first, rest) = conditions
        .split_first()
        .ok_or_else(|| CrosstabError::invalid_condition("condition list is empty"))?;

    let mut mask = evaluate_condition(dataset, first)?;
    for condition in rest {
        let next = evaluate_condition(dataset, condition)?;
        for (acc, value) in mask.iter_mut().zip(next) {
            *acc = match condition.operator {
                Connective::And => *acc && value,
                Connective::Or => *acc || value,
            };
        }
    }
    Ok(mask)
}

/// Materializes each custom variable as a 0/1 `Int32` column on a working copy.
///
/// Definitions are applied in order, so a later definition may reference an
/// earlier one. An existing column with the same name is replaced.
pub fn derive_custom_variables(dataset: &Dataset, variables: &[CustomVariable]) -> Result<Dataset> {
    let mut working = dataset.working_copy();
    for variable in variables {
        if variable.name.trim().is_empty() {
            return Err(CrosstabError::invalid_condition(
                "custom variable name is empty",
            ));
        }
        if variable.conditions.is_empty() {
            return Err(CrosstabError::invalid_condition(format!(
                "custom variable '{}' has no conditions",
                variable.name
            )));
        }
        let mask = evaluate_conditions(&working, &variable.conditions)?;
        let values: Vec<i32> = mask.iter().map(|&hit| i32::from(hit)).collect();
        let selected = values.iter().filter(|&&v| v == 1).count();

        let mut meta = ColumnMeta::new(ColumnKind::Numeric);
        if let Some(label) = &variable.label {
            meta = meta.with_label(label.clone());
        }
        if working.has_column(&variable.name) {
            debug!(variable = %variable.name, "replacing existing column");
        }
        working.put_column(Series::new(variable.name.as_str().into(), values), meta)?;
        info!(
            variable = %variable.name,
            conditions = variable.conditions.len(),
            selected,
            "custom variable derived"
        );
    }
    Ok(working)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn survey() -> Dataset {
        let frame = DataFrame::new(vec![
            Column::new("age".into(), [Some(17i64), Some(22), Some(40), None]),
            Column::new("gender".into(), ["M", "F", "M", "F"]),
            Column::new("city".into(), [Some("New York"), Some("Boston"), None, Some("york")]),
        ])
        .unwrap();
        Dataset::new(frame)
    }

    fn derived(dataset: &Dataset, name: &str) -> Vec<i32> {
        let column = dataset.column(name).unwrap();
        assert_eq!(column.dtype(), &DataType::Int32);
        (0..column.len())
            .map(|idx| any_to_f64(column.get(idx).unwrap()).unwrap() as i32)
            .collect()
    }

    #[test]
    fn greater_than_on_numeric_column() {
        let frame = DataFrame::new(vec![Column::new("age".into(), [17i64, 22, 40])]).unwrap();
        let dataset = Dataset::new(frame);
        let variable = CustomVariable::new(
            "adult",
            vec![Condition::new("age", Comparator::GreaterThan, "18")],
        );
        let working = derive_custom_variables(&dataset, &[variable]).unwrap();
        assert_eq!(derived(&working, "adult"), vec![0, 1, 1]);
        assert!(!dataset.has_column("adult"));
    }

    #[test]
    fn conditions_fold_left_to_right() {
        // (gender == M OR age < 20) AND city contains "york"
        let conditions = vec![
            Condition::new("gender", Comparator::Equals, "M"),
            Condition::new("age", Comparator::LessThan, "20").joined_by(Connective::Or),
            Condition::new("city", Comparator::Contains, "YORK").joined_by(Connective::And),
        ];
        let mask = evaluate_conditions(&survey(), &conditions).unwrap();
        assert_eq!(mask, vec![true, false, false, false]);
    }

    #[test]
    fn equals_is_type_sensitive() {
        let dataset = survey();
        let numeric = evaluate_conditions(
            &dataset,
            &[Condition::new("age", Comparator::Equals, "22.0")],
        )
        .unwrap();
        assert_eq!(numeric, vec![false, true, false, false]);

        let text_against_number = evaluate_conditions(
            &dataset,
            &[Condition::new("age", Comparator::Equals, "twenty")],
        )
        .unwrap();
        assert!(text_against_number.iter().all(|hit| !hit));
    }

    #[test]
    fn nulls_never_match() {
        let mask = evaluate_conditions(
            &survey(),
            &[Condition::new("age", Comparator::LessThan, "100")],
        )
        .unwrap();
        assert_eq!(mask, vec![true, true, true, false]);
    }

    #[test]
    fn non_numeric_literal_is_invalid() {
        let err = evaluate_conditions(
            &survey(),
            &[Condition::new("age", Comparator::GreaterThan, "old")],
        )
        .unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidCondition { .. }));
    }

    #[test]
    fn unknown_column_and_empty_list_fail() {
        let dataset = survey();
        let err = evaluate_conditions(
            &dataset,
            &[Condition::new("income", Comparator::Equals, "1")],
        )
        .unwrap_err();
        assert!(matches!(err, CrosstabError::ColumnNotFound { ref column } if column == "income"));

        let err = derive_custom_variables(&dataset, &[CustomVariable::new("x", vec![])]).unwrap_err();
        assert!(matches!(err, CrosstabError::InvalidCondition { .. }));
    }

    #[test]
    fn derived_column_overwrites_and_chains() {
        let dataset = survey();
        let first = CustomVariable::new(
            "gender",
            vec![Condition::new("gender", Comparator::Equals, "F")],
        );
        let second = CustomVariable::new(
            "older_female",
            vec![
                Condition::new("gender", Comparator::Equals, "1"),
                Condition::new("age", Comparator::GreaterThan, "18"),
            ],
        )
        .with_label("Female, 19+");
        let working = derive_custom_variables(&dataset, &[first, second]).unwrap();
        assert_eq!(derived(&working, "gender"), vec![0, 1, 0, 1]);
        assert_eq!(derived(&working, "older_female"), vec![0, 1, 0, 0]);
        assert_eq!(
            working.meta("older_female").and_then(|m| m.label.as_deref()),
            Some("Female, 19+")
        );
        assert_eq!(working.kind("gender"), Some(ColumnKind::Numeric));
    }
}
