//! In-memory survey dataset with per-column metadata.
//!
//! Column kinds are resolved once, when the dataset is built, so that the
//! custom-variable comparators and the crosstab builder read a column the
//! same way.

use std::collections::BTreeMap;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use xtab_common::is_numeric_dtype;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Temporal,
}

impl ColumnKind {
    /// Infers the kind from a Polars dtype.
    pub fn from_dtype(dtype: &DataType) -> Self {
        if is_numeric_dtype(dtype) || dtype.is_bool() {
            ColumnKind::Numeric
        } else if dtype.is_temporal() {
            ColumnKind::Temporal
        } else {
            ColumnKind::Text
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Temporal => "temporal",
        }
    }
}

/// Metadata for one column, supplied by the loader or inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub kind: ColumnKind,
    /// Human-readable question text.
    #[serde(default)]
    pub label: Option<String>,
    /// Code to label mapping, e.g. `1 -> "Male"`.
    #[serde(default)]
    pub value_labels: BTreeMap<String, String>,
    /// User-defined missing codes; matching values are treated as null.
    #[serde(default)]
    pub missing_values: Vec<String>,
}

impl ColumnMeta {
    pub fn new(kind: ColumnKind) -> Self {
        Self {
            kind,
            label: None,
            value_labels: BTreeMap::new(),
            missing_values: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_missing_values(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.missing_values = values.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_value_label(mut self, code: impl Into<String>, label: impl Into<String>) -> Self {
        self.value_labels.insert(code.into(), label.into());
        self
    }

    /// Returns true if `text` is one of the declared missing codes.
    pub fn is_missing_code(&self, text: &str) -> bool {
        let trimmed = text.trim();
        self.missing_values.iter().any(|code| code.trim() == trimmed)
    }
}

/// A tabular dataset: a Polars frame plus resolved column metadata.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
    columns: BTreeMap<String, ColumnMeta>,
}

impl Dataset {
    /// Wraps a frame, inferring every column's kind from its dtype.
    pub fn new(frame: DataFrame) -> Self {
        Self::with_metadata(frame, BTreeMap::new())
    }

    /// Wraps a frame, preferring loader-supplied metadata over inference.
    ///
    /// Metadata entries for columns that are not in the frame are dropped.
    pub fn with_metadata(frame: DataFrame, mut supplied: BTreeMap<String, ColumnMeta>) -> Self {
        let mut columns = BTreeMap::new();
        for column in frame.get_columns() {
            let name = column.name().to_string();
            let meta = supplied
                .remove(&name)
                .unwrap_or_else(|| ColumnMeta::new(ColumnKind::from_dtype(column.dtype())));
            columns.insert(name, meta);
        }
        Self { frame, columns }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Column names in frame order.
    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.frame.column(name).ok()
    }

    pub fn meta(&self, name: &str) -> Option<&ColumnMeta> {
        self.columns.get(name)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.get(name).map(|meta| meta.kind)
    }

    /// Clone used for per-request derivations; the frame's buffers are shared.
    pub fn working_copy(&self) -> Self {
        self.clone()
    }

    /// Adds a column, replacing any existing column of the same name.
    pub fn put_column(&mut self, series: Series, meta: ColumnMeta) -> PolarsResult<()> {
        let name = series.name().to_string();
        self.frame.with_column(series)?;
        self.columns.insert(name, meta);
        Ok(())
    }

    /// Consumes the dataset and returns the underlying frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let frame = DataFrame::new(vec![
            Series::new("age".into(), vec![17i64, 22, 40]).into_column(),
            Series::new("gender".into(), vec!["M", "F", "M"]).into_column(),
        ])
        .unwrap();
        Dataset::new(frame)
    }

    #[test]
    fn kinds_are_inferred_from_dtype() {
        let dataset = sample();
        assert_eq!(dataset.kind("age"), Some(ColumnKind::Numeric));
        assert_eq!(dataset.kind("gender"), Some(ColumnKind::Text));
        assert_eq!(dataset.kind("missing"), None);
    }

    #[test]
    fn supplied_metadata_wins() {
        let frame = DataFrame::new(vec![
            Series::new("code".into(), vec!["1", "2"]).into_column(),
        ])
        .unwrap();
        let mut metas = BTreeMap::new();
        metas.insert(
            "code".to_string(),
            ColumnMeta::new(ColumnKind::Numeric).with_label("Region code"),
        );
        metas.insert("ghost".to_string(), ColumnMeta::new(ColumnKind::Text));
        let dataset = Dataset::with_metadata(frame, metas);
        assert_eq!(dataset.kind("code"), Some(ColumnKind::Numeric));
        assert!(!dataset.has_column("ghost"));
    }

    #[test]
    fn put_column_leaves_original_untouched() {
        let original = sample();
        let mut working = original.working_copy();
        working
            .put_column(
                Series::new("adult".into(), vec![0i32, 1, 1]),
                ColumnMeta::new(ColumnKind::Numeric),
            )
            .unwrap();
        assert!(working.has_column("adult"));
        assert!(!original.has_column("adult"));
        assert_eq!(original.frame().width(), 2);
    }

    #[test]
    fn missing_codes_match_trimmed_text() {
        let meta = ColumnMeta::new(ColumnKind::Numeric).with_missing_values(["99", " -1"]);
        assert!(meta.is_missing_code("99"));
        assert!(meta.is_missing_code("-1 "));
        assert!(!meta.is_missing_code("9"));
    }
}
