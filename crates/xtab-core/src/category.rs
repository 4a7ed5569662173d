//! Category values and axis labels.
//!
//! Categories order numerically when they come from a numeric column and
//! lexicographically otherwise; the `Missing` category always sorts last.

use std::cmp::Ordering;
use std::fmt;

use polars::prelude::AnyValue;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use xtab_common::{any_to_f64, any_to_string, format_numeric, is_missing};
use xtab_model::{ColumnKind, ColumnMeta};

/// Display text for the missing category when nulls are kept.
pub const MISSING_LABEL: &str = "Missing";

/// One value of a categorical variable.
#[derive(Debug, Clone)]
pub enum Category {
    Number(f64),
    Text(String),
    /// An option entry of a multi-response variable, labelled `{variable}_{option}`.
    Option(String),
    Missing,
}

impl Category {
    /// Reads a cell through its column's resolved kind.
    ///
    /// Nulls, NaN, and declared missing codes all become [`Category::Missing`].
    pub fn from_cell(value: AnyValue<'_>, kind: ColumnKind, meta: Option<&ColumnMeta>) -> Self {
        if is_missing(&value) {
            return Category::Missing;
        }
        let text = any_to_string(value.clone());
        if meta.is_some_and(|meta| meta.is_missing_code(&text)) {
            return Category::Missing;
        }
        match kind {
            ColumnKind::Numeric => match any_to_f64(value) {
                Some(number) if number.is_finite() => Category::Number(number),
                _ => Category::Text(text),
            },
            ColumnKind::Text | ColumnKind::Temporal => Category::Text(text),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Category::Missing)
    }

    fn rank(&self) -> u8 {
        match self {
            Category::Number(_) => 0,
            Category::Text(_) => 1,
            Category::Option(_) => 2,
            Category::Missing => 3,
        }
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Category {}

impl PartialOrd for Category {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Category {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Category::Number(a), Category::Number(b)) => a.total_cmp(b),
            (Category::Text(a), Category::Text(b)) | (Category::Option(a), Category::Option(b)) => {
                a.cmp(b)
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Number(n) => f.write_str(&format_numeric(*n)),
            Category::Text(s) | Category::Option(s) => f.write_str(s),
            Category::Missing => f.write_str(MISSING_LABEL),
        }
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Category::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Category::Number(n) => serializer.serialize_f64(*n),
            Category::Text(s) | Category::Option(s) => serializer.serialize_str(s),
            Category::Missing => serializer.serialize_none(),
        }
    }
}

/// Label of one axis entry: one category per variable in the entry's block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AxisLabel(pub Vec<Category>);

impl AxisLabel {
    pub fn single(category: Category) -> Self {
        Self(vec![category])
    }

    pub fn categories(&self) -> &[Category] {
        &self.0
    }

    /// Stringified key; multi-variable labels are joined with `_`.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl From<Category> for AxisLabel {
    fn from(category: Category) -> Self {
        Self::single(category)
    }
}

impl fmt::Display for AxisLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, category) in self.0.iter().enumerate() {
            if idx > 0 {
                f.write_str("_")?;
            }
            write!(f, "{category}")?;
        }
        Ok(())
    }
}

impl Serialize for AxisLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let [only] = self.0.as_slice() {
            return only.serialize(serializer);
        }
        let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
        for category in &self.0 {
            seq.serialize_element(category)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_sort_numerically_and_missing_last() {
        let mut categories = vec![
            Category::Missing,
            Category::Number(10.0),
            Category::Number(9.0),
            Category::Text("b".into()),
            Category::Text("a".into()),
        ];
        categories.sort();
        let keys: Vec<String> = categories.iter().map(ToString::to_string).collect();
        assert_eq!(keys, vec!["9", "10", "a", "b", "Missing"]);
    }

    #[test]
    fn cells_read_through_kind() {
        assert_eq!(
            Category::from_cell(AnyValue::String("2"), ColumnKind::Numeric, None),
            Category::Number(2.0)
        );
        assert_eq!(
            Category::from_cell(AnyValue::Int64(2), ColumnKind::Text, None),
            Category::Text("2".into())
        );
        assert!(Category::from_cell(AnyValue::Null, ColumnKind::Text, None).is_missing());
    }

    #[test]
    fn declared_missing_codes_are_missing() {
        let meta = ColumnMeta::new(ColumnKind::Numeric).with_missing_values(["99"]);
        assert!(Category::from_cell(AnyValue::Int32(99), ColumnKind::Numeric, Some(&meta)).is_missing());
        assert!(!Category::from_cell(AnyValue::Int32(9), ColumnKind::Numeric, Some(&meta)).is_missing());
    }

    #[test]
    fn tuple_labels_join_with_underscore() {
        let label = AxisLabel(vec![Category::Text("M".into()), Category::Number(1.0)]);
        assert_eq!(label.key(), "M_1");
        assert_eq!(serde_json::to_string(&label).unwrap(), r#"["M",1]"#);
        assert_eq!(
            serde_json::to_string(&AxisLabel::single(Category::Missing)).unwrap(),
            "null"
        );
    }
}
