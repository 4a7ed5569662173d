//! Dense contingency tables.

use crate::category::AxisLabel;
use crate::error::{CrosstabError, Result};

/// A dense row-by-column matrix of counts or weighted sums with ordered labels.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
    row_axis: Vec<String>,
    column_axis: Vec<String>,
    row_labels: Vec<AxisLabel>,
    column_labels: Vec<AxisLabel>,
    cells: Vec<Vec<f64>>,
}

impl ContingencyTable {
    /// Builds a table, checking that `cells` is `row_labels × column_labels`.
    pub fn new(
        row_axis: Vec<String>,
        column_axis: Vec<String>,
        row_labels: Vec<AxisLabel>,
        column_labels: Vec<AxisLabel>,
        cells: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if cells.len() != row_labels.len()
            || cells.iter().any(|row| row.len() != column_labels.len())
        {
            return Err(CrosstabError::invalid_request(format!(
                "cell matrix does not match {} row and {} column labels",
                row_labels.len(),
                column_labels.len()
            )));
        }
        Ok(Self {
            row_axis,
            column_axis,
            row_labels,
            column_labels,
            cells,
        })
    }

    /// Variable names driving the row axis.
    pub fn row_axis(&self) -> &[String] {
        &self.row_axis
    }

    /// Variable names driving the column axis.
    pub fn column_axis(&self) -> &[String] {
        &self.column_axis
    }

    pub fn row_labels(&self) -> &[AxisLabel] {
        &self.row_labels
    }

    pub fn column_labels(&self) -> &[AxisLabel] {
        &self.column_labels
    }

    pub fn cells(&self) -> &[Vec<f64>] {
        &self.cells
    }

    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    pub fn n_cols(&self) -> usize {
        self.column_labels.len()
    }

    /// `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_cols())
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows() == 0 || self.n_cols() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells.get(row).and_then(|cells| cells.get(col)).copied()
    }

    pub fn row_totals(&self) -> Vec<f64> {
        self.cells.iter().map(|row| row.iter().sum()).collect()
    }

    pub fn column_totals(&self) -> Vec<f64> {
        (0..self.n_cols())
            .map(|col| self.cells.iter().map(|row| row[col]).sum())
            .collect()
    }

    pub fn grand_total(&self) -> f64 {
        self.cells.iter().flatten().sum()
    }

    /// Same table with the row and column axes swapped.
    pub fn transpose(&self) -> Self {
        let cells = (0..self.n_cols())
            .map(|col| self.cells.iter().map(|row| row[col]).collect())
            .collect();
        Self {
            row_axis: self.column_axis.clone(),
            column_axis: self.row_axis.clone(),
            row_labels: self.column_labels.clone(),
            column_labels: self.row_labels.clone(),
            cells,
        }
    }

    /// Same labels, new cell values of the same shape.
    pub(crate) fn with_cells(&self, cells: Vec<Vec<f64>>) -> Self {
        Self {
            row_axis: self.row_axis.clone(),
            column_axis: self.column_axis.clone(),
            row_labels: self.row_labels.clone(),
            column_labels: self.column_labels.clone(),
            cells,
        }
    }

    /// Indices of rows and columns that hold at least one non-zero cell.
    pub fn non_empty_indices(&self) -> (Vec<usize>, Vec<usize>) {
        let rows = (0..self.n_rows())
            .filter(|&row| self.cells[row].iter().any(|&v| v != 0.0))
            .collect();
        let cols = (0..self.n_cols())
            .filter(|&col| self.cells.iter().any(|row| row[col] != 0.0))
            .collect();
        (rows, cols)
    }

    /// Keeps only the given rows and columns, in the given order.
    pub fn select(&self, rows: &[usize], cols: &[usize]) -> Self {
        Self {
            row_axis: self.row_axis.clone(),
            column_axis: self.column_axis.clone(),
            row_labels: rows.iter().map(|&r| self.row_labels[r].clone()).collect(),
            column_labels: cols.iter().map(|&c| self.column_labels[c].clone()).collect(),
            cells: rows
                .iter()
                .map(|&r| cols.iter().map(|&c| self.cells[r][c]).collect())
                .collect(),
        }
    }

    /// Drops all-zero rows and columns. Returns true if anything was removed.
    pub fn prune_empty(&mut self) -> bool {
        let (rows, cols) = self.non_empty_indices();
        if rows.len() == self.n_rows() && cols.len() == self.n_cols() {
            return false;
        }
        *self = self.select(&rows, &cols);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;

    fn labels(names: &[&str]) -> Vec<AxisLabel> {
        names
            .iter()
            .map(|n| AxisLabel::single(Category::Text((*n).to_string())))
            .collect()
    }

    fn table(cells: Vec<Vec<f64>>) -> ContingencyTable {
        let rows: Vec<String> = (0..cells.len()).map(|i| format!("r{i}")).collect();
        let cols: Vec<String> = (0..cells[0].len()).map(|i| format!("c{i}")).collect();
        let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        let col_refs: Vec<&str> = cols.iter().map(String::as_str).collect();
        ContingencyTable::new(
            vec!["row".into()],
            vec!["col".into()],
            labels(&row_refs),
            labels(&col_refs),
            cells,
        )
        .unwrap()
    }

    #[test]
    fn marginals() {
        let t = table(vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(t.row_totals(), vec![3.0, 7.0]);
        assert_eq!(t.column_totals(), vec![4.0, 6.0]);
        assert_eq!(t.grand_total(), 10.0);
    }

    #[test]
    fn prune_removes_zero_axes_once() {
        let mut t = table(vec![vec![0.0, 0.0, 0.0], vec![1.0, 0.0, 2.0]]);
        assert!(t.prune_empty());
        assert_eq!(t.shape(), (1, 2));
        assert_eq!(t.row_labels()[0].key(), "r1");
        assert_eq!(t.column_labels()[1].key(), "c2");
        assert!(!t.prune_empty());
    }

    #[test]
    fn ragged_cells_rejected() {
        let result = ContingencyTable::new(
            vec![],
            vec![],
            labels(&["a"]),
            labels(&["x", "y"]),
            vec![vec![1.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn transpose_swaps_axes() {
        let t = table(vec![vec![1.0, 2.0, 3.0]]);
        let tt = t.transpose();
        assert_eq!(tt.shape(), (3, 1));
        assert_eq!(tt.row_axis(), &["col".to_string()]);
        assert_eq!(tt.get(2, 0), Some(3.0));
    }
}
