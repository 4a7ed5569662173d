//! Custom variable definitions.
//!
//! A custom variable is a binary column derived from an ordered list of
//! comparator conditions, folded left to right with AND / OR.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ModelError;

/// Comparison applied between a column value and a literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    /// Exact match, interpreted through the column's resolved kind.
    Equals,
    /// Case-insensitive substring match on the value's text form.
    Contains,
    /// Numeric comparison; the literal must parse as a number.
    GreaterThan,
    /// Numeric comparison; the literal must parse as a number.
    LessThan,
}

impl Comparator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Comparator::Equals => "equals",
            Comparator::Contains => "contains",
            Comparator::GreaterThan => "greater_than",
            Comparator::LessThan => "less_than",
        }
    }

    /// Returns true for comparators that need a numeric literal.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Comparator::GreaterThan | Comparator::LessThan)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Comparator {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "equals" | "eq" => Ok(Comparator::Equals),
            "contains" => Ok(Comparator::Contains),
            "greater_than" | "gt" => Ok(Comparator::GreaterThan),
            "less_than" | "lt" => Ok(Comparator::LessThan),
            other => Err(ModelError::UnknownComparator(other.to_string())),
        }
    }
}

/// Boolean connective joining a condition to the running mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connective {
    #[default]
    And,
    Or,
}

/// A single `(column, comparator, literal, operator)` condition.
///
/// `operator` joins this condition to the mask accumulated so far; it is
/// ignored on the first condition of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    #[serde(alias = "comparison")]
    pub comparator: Comparator,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(default)]
    pub operator: Connective,
}

impl Condition {
    pub fn new(
        column: impl Into<String>,
        comparator: Comparator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            comparator,
            value: value.into(),
            operator: Connective::And,
        }
    }

    /// Sets the connective used to join this condition to the previous mask.
    #[must_use]
    pub fn joined_by(mut self, operator: Connective) -> Self {
        self.operator = operator;
        self
    }
}

/// A derived binary variable: 1 where the condition tree holds, else 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomVariable {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    pub conditions: Vec<Condition>,
}

impl CustomVariable {
    pub fn new(name: impl Into<String>, conditions: Vec<Condition>) -> Self {
        Self {
            name: name.into(),
            label: None,
            conditions,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Accepts either a JSON string or a JSON number for condition literals.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Literal {
        Text(String),
        Integer(i64),
        Float(f64),
        Flag(bool),
    }

    Ok(match Literal::deserialize(deserializer)? {
        Literal::Text(s) => s,
        Literal::Integer(v) => v.to_string(),
        Literal::Float(v) => xtab_common::format_numeric(v),
        Literal::Flag(b) => b.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparator_parses_aliases() {
        assert_eq!("greater_than".parse::<Comparator>(), Ok(Comparator::GreaterThan));
        assert_eq!(" LT ".parse::<Comparator>(), Ok(Comparator::LessThan));
        assert_eq!(
            "between".parse::<Comparator>(),
            Err(ModelError::UnknownComparator("between".to_string()))
        );
    }

    #[test]
    fn condition_accepts_numeric_literal() {
        let condition: Condition = serde_json::from_str(
            r#"{"column": "age", "comparison": "greater_than", "value": 18, "operator": "OR"}"#,
        )
        .unwrap();
        assert_eq!(condition.comparator, Comparator::GreaterThan);
        assert_eq!(condition.value, "18");
        assert_eq!(condition.operator, Connective::Or);
    }

    #[test]
    fn condition_operator_defaults_to_and() {
        let condition: Condition =
            serde_json::from_str(r#"{"column": "q1", "comparator": "equals", "value": "Yes"}"#)
                .unwrap();
        assert_eq!(condition.operator, Connective::And);
    }
}
