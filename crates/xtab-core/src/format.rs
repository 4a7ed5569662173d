//! Percentages, rounding, and the serialized table shape.

use std::collections::HashSet;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::warn;

use crate::category::AxisLabel;
use crate::table::ContingencyTable;

/// Which marginal a percentage table is normalized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentageKind {
    Row,
    Column,
    Total,
}

impl PercentageKind {
    /// Key used in the serialized payload.
    pub fn key(&self) -> &'static str {
        match self {
            PercentageKind::Row => "row_pct",
            PercentageKind::Column => "col_pct",
            PercentageKind::Total => "total_pct",
        }
    }
}

/// Percentage table with the labels of `table`. A zero total yields 0.
pub fn percentages(table: &ContingencyTable, kind: PercentageKind) -> ContingencyTable {
    let row_totals = table.row_totals();
    let col_totals = table.column_totals();
    let grand = table.grand_total();
    let ratio = |value: f64, total: f64| if total == 0.0 { 0.0 } else { value / total * 100.0 };

    let cells = table
        .cells()
        .iter()
        .enumerate()
        .map(|(r, row)| {
            row.iter()
                .enumerate()
                .map(|(c, &value)| match kind {
                    PercentageKind::Row => ratio(value, row_totals[r]),
                    PercentageKind::Column => ratio(value, col_totals[c]),
                    PercentageKind::Total => ratio(value, grand),
                })
                .collect()
        })
        .collect();
    table.with_cells(cells)
}

/// Rounds half away from zero; NaN and infinities become 0.
pub fn round_half_away(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals.min(15) as i32);
    let rounded = (value * factor).round() / factor;
    // Normalize -0.0 so it serializes as 0.
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// A table ready for output: rounded values keyed by stringified labels.
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedTable {
    rows: Vec<(String, Vec<(String, f64)>)>,
    row_axis: Vec<String>,
    column_axis: Vec<String>,
    original_rows: Vec<AxisLabel>,
    original_columns: Vec<AxisLabel>,
}

impl FormattedTable {
    /// Row keys in order.
    pub fn row_keys(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(key, _)| key.as_str())
    }

    /// Column keys in order.
    pub fn column_keys(&self) -> impl Iterator<Item = &str> {
        self.rows
            .first()
            .into_iter()
            .flat_map(|(_, cols)| cols.iter().map(|(key, _)| key.as_str()))
    }

    /// Rounded value at `(row, column)` keys.
    pub fn value(&self, row: &str, column: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|(key, _)| key == row)
            .and_then(|(_, cols)| cols.iter().find(|(key, _)| key == column))
            .map(|(_, value)| *value)
    }

    /// Rows as `(key, [(column key, value)])` in order.
    pub fn rows(&self) -> &[(String, Vec<(String, f64)>)] {
        &self.rows
    }

    pub fn row_axis(&self) -> &[String] {
        &self.row_axis
    }

    pub fn column_axis(&self) -> &[String] {
        &self.column_axis
    }

    pub fn original_rows(&self) -> &[AxisLabel] {
        &self.original_rows
    }

    pub fn original_columns(&self) -> &[AxisLabel] {
        &self.original_columns
    }
}

/// Keys for `labels`, unique within the axis.
///
/// Distinct labels can print alike: a text answer `Missing` next to the
/// missing category, or a category named like an option column. Later
/// repeats get a ` (2)`, ` (3)`, ... suffix so no entry is shadowed.
fn unique_keys(labels: &[AxisLabel]) -> Vec<String> {
    let mut seen = HashSet::new();
    labels
        .iter()
        .map(|label| {
            let base = label.key();
            let mut key = base.clone();
            let mut n = 1;
            while !seen.insert(key.clone()) {
                n += 1;
                key = format!("{base} ({n})");
            }
            if n > 1 {
                warn!(label = %base, %key, "axis labels collide; key disambiguated");
            }
            key
        })
        .collect()
}

/// Formats `table` with values rounded to `decimals`.
pub fn format_table(table: &ContingencyTable, decimals: u32) -> FormattedTable {
    let column_keys = unique_keys(table.column_labels());
    let rows = unique_keys(table.row_labels())
        .into_iter()
        .zip(table.cells())
        .map(|(row_key, cells)| {
            let values = column_keys
                .iter()
                .zip(cells)
                .map(|(key, &value)| (key.clone(), round_half_away(value, decimals)))
                .collect();
            (row_key, values)
        })
        .collect();
    FormattedTable {
        rows,
        row_axis: table.row_axis().to_vec(),
        column_axis: table.column_axis().to_vec(),
        original_rows: table.row_labels().to_vec(),
        original_columns: table.column_labels().to_vec(),
    }
}

struct OrderedRow<'a>(&'a [(String, f64)]);

impl Serialize for OrderedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedRows<'a>(&'a [(String, Vec<(String, f64)>)]);

impl Serialize for OrderedRows<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, row) in self.0 {
            map.serialize_entry(key, &OrderedRow(row))?;
        }
        map.end()
    }
}

impl Serialize for FormattedTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FormattedTable", 5)?;
        state.serialize_field("data", &OrderedRows(&self.rows))?;
        state.serialize_field("row_axis", &self.row_axis)?;
        state.serialize_field("column_axis", &self.column_axis)?;
        state.serialize_field("original_rows", &self.original_rows)?;
        state.serialize_field("original_columns", &self.original_columns)?;
        state.end()
    }
}

/// Formatted percentage tables, present when requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Percentages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_pct: Option<FormattedTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub col_pct: Option<FormattedTable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pct: Option<FormattedTable>,
}

impl Percentages {
    pub fn is_empty(&self) -> bool {
        self.row_pct.is_none() && self.col_pct.is_none() && self.total_pct.is_none()
    }

    /// Present tables with their payload keys.
    pub fn iter(&self) -> impl Iterator<Item = (PercentageKind, &FormattedTable)> {
        [
            (PercentageKind::Row, self.row_pct.as_ref()),
            (PercentageKind::Column, self.col_pct.as_ref()),
            (PercentageKind::Total, self.total_pct.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, table)| table.map(|table| (kind, table)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn table(cells: Vec<Vec<f64>>) -> ContingencyTable {
        let label = |s: &str| AxisLabel::single(Category::Text(s.to_string()));
        ContingencyTable::new(
            vec!["gender".into()],
            vec!["vote".into()],
            vec![label("F"), label("M")],
            vec![label("N"), label("Y")],
            cells,
        )
        .unwrap()
    }

    #[test]
    fn percentages_by_margin() {
        let t = table(vec![vec![1.0, 1.0], vec![0.0, 2.0]]);
        assert_eq!(
            percentages(&t, PercentageKind::Row).cells(),
            &[vec![50.0, 50.0], vec![0.0, 100.0]]
        );
        assert_eq!(
            percentages(&t, PercentageKind::Column).cells(),
            &[vec![100.0, 100.0 / 3.0], vec![0.0, 200.0 / 3.0]]
        );
        assert_eq!(
            percentages(&t, PercentageKind::Total).cells(),
            &[vec![25.0, 25.0], vec![0.0, 50.0]]
        );
    }

    #[test]
    fn zero_totals_give_zero() {
        let t = table(vec![vec![0.0, 0.0], vec![0.0, 2.0]]);
        let row = percentages(&t, PercentageKind::Row);
        assert_eq!(row.cells()[0], vec![0.0, 0.0]);
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_half_away(2.5, 0), 3.0);
        assert_eq!(round_half_away(-2.5, 0), -3.0);
        assert_eq!(round_half_away(33.333_333, 1), 33.3);
        assert_eq!(round_half_away(66.666_666, 2), 66.67);
        assert_eq!(round_half_away(f64::NAN, 1), 0.0);
        assert_eq!(round_half_away(-0.01, 1).to_string(), "0");
    }

    #[test]
    fn colliding_labels_get_distinct_keys() {
        let rows = vec![
            AxisLabel::single(Category::Text("Missing".into())),
            AxisLabel::single(Category::Text("Yes".into())),
            AxisLabel::single(Category::Missing),
        ];
        let cols = vec![AxisLabel::single(Category::Text("a".into()))];
        let t = ContingencyTable::new(
            vec!["q".into()],
            vec!["r".into()],
            rows,
            cols,
            vec![vec![1.0], vec![2.0], vec![3.0]],
        )
        .unwrap();
        let formatted = format_table(&t, 1);
        let keys: Vec<&str> = formatted.row_keys().collect();
        assert_eq!(keys, vec!["Missing", "Yes", "Missing (2)"]);
        assert_eq!(formatted.value("Missing (2)", "a"), Some(3.0));
    }

    #[test]
    fn serialized_keys_keep_table_order() {
        let t = table(vec![vec![1.0, 1.0], vec![0.0, 2.0]]);
        let formatted = format_table(&percentages(&t, PercentageKind::Column), 1);
        assert_eq!(formatted.value("M", "Y"), Some(66.7));
        let json = serde_json::to_string(&formatted).unwrap();
        assert!(json.starts_with(r#"{"data":{"F":{"N":100.0,"Y":33.3},"M":{"N":0.0,"Y":66.7}}"#));
        assert!(json.contains(r#""original_rows":["F","M"]"#));
    }
}
