//! Header rows of a survey export.
//!
//! Survey tools commonly export two header rows: the question text on the
//! first line and the short variable name on the second.

use std::collections::BTreeMap;

/// Header layout of a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvHeaders {
    /// Variable names, trimmed.
    pub columns: Vec<String>,
    /// Question text per column when the file has a label row.
    pub labels: Option<Vec<String>>,
    /// Lines consumed by headers before the first data row.
    pub skip_rows: usize,
}

impl CsvHeaders {
    pub fn single(columns: Vec<String>) -> Self {
        Self {
            columns,
            labels: None,
            skip_rows: 1,
        }
    }

    /// Label row first, then the name row.
    pub fn double(labels: Vec<String>, columns: Vec<String>) -> Self {
        Self {
            columns,
            labels: Some(labels),
            skip_rows: 2,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the question text for `column`, if the file carries one.
    pub fn label_for(&self, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.labels
            .as_ref()
            .and_then(|labels| labels.get(idx))
            .map(String::as_str)
            .filter(|label| !label.is_empty())
    }

    /// Non-empty labels keyed by variable name.
    pub fn labels_by_column(&self) -> BTreeMap<String, String> {
        self.columns
            .iter()
            .filter_map(|column| {
                self.label_for(column)
                    .map(|label| (column.clone(), label.to_string()))
            })
            .collect()
    }
}

/// Splits one header line into trimmed fields, honouring `"` quoting.
pub fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, quoted) {
            ('"', false) => quoted = true,
            ('"', true) if chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            ('"', true) => quoted = false,
            (',', false) => fields.push(std::mem::take(&mut field).trim().to_string()),
            (other, _) => field.push(other),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_header_labels() {
        let headers = CsvHeaders::double(
            vec!["What is your gender?".to_string(), String::new()],
            vec!["gender".to_string(), "age".to_string()],
        );
        assert_eq!(headers.skip_rows, 2);
        assert_eq!(headers.label_for("gender"), Some("What is your gender?"));
        assert_eq!(headers.label_for("age"), None);
        assert_eq!(headers.labels_by_column().len(), 1);
    }

    #[test]
    fn test_single_header_has_no_labels() {
        let headers = CsvHeaders::single(vec!["q1".to_string()]);
        assert_eq!(headers.label_for("q1"), None);
        assert!(!headers.is_empty());
    }

    #[test]
    fn test_parse_csv_line_quoted() {
        assert_eq!(
            parse_csv_line("\"Brands, used\", q2 ,\"say \"\"hi\"\"\""),
            vec!["Brands, used", "q2", "say \"hi\""]
        );
    }

    #[test]
    fn test_parse_csv_line_trailing_empty() {
        assert_eq!(parse_csv_line("a,b,"), vec!["a", "b", ""]);
    }
}
