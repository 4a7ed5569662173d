//! Loading survey files through the registry.

use std::io::Write;
use std::path::Path;

use polars::prelude::{Column, DataFrame};
use tempfile::Builder;
use xtab_ingest::{CsvLoader, DatasetLoader, IngestError, LoaderRegistry};
use xtab_model::{ColumnKind, Dataset};

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn csv_kinds_are_resolved_at_load() {
    let file = write_csv("gender,age,brands\nM,17,\"A,B\"\nF,22,B\nM,40,\n");
    let dataset = LoaderRegistry::with_defaults().load(file.path()).unwrap();

    assert_eq!(dataset.height(), 3);
    assert_eq!(dataset.column_names(), vec!["gender", "age", "brands"]);
    assert_eq!(dataset.kind("gender"), Some(ColumnKind::Text));
    assert_eq!(dataset.kind("age"), Some(ColumnKind::Numeric));
    assert_eq!(dataset.kind("brands"), Some(ColumnKind::Text));
}

#[test]
fn label_row_becomes_column_labels() {
    let file = write_csv("Respondent gender,Age in years\ngender,age\nM,17\nF,22\n");
    let dataset = CsvLoader::new().with_label_row().load(file.path()).unwrap();

    let meta = dataset.meta("gender").unwrap();
    assert_eq!(meta.label.as_deref(), Some("Respondent gender"));
    assert_eq!(dataset.kind("age"), Some(ColumnKind::Numeric));
    assert_eq!(dataset.height(), 2);
}

#[test]
fn missing_file_is_reported() {
    let err = LoaderRegistry::with_defaults()
        .load(Path::new("/nonexistent/survey.csv"))
        .unwrap_err();
    assert!(matches!(err, IngestError::FileNotFound { .. }));
}

#[test]
fn size_limit_is_enforced() {
    let file = write_csv("gender\nM\nF\n");
    let err = CsvLoader::new()
        .with_max_file_size(4)
        .load(file.path())
        .unwrap_err();
    assert!(matches!(err, IngestError::FileTooLarge { .. }));
}

struct FixedLoader;

impl DatasetLoader for FixedLoader {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn extensions(&self) -> &[&'static str] {
        &["sav"]
    }

    fn load(&self, _path: &Path) -> xtab_ingest::Result<Dataset> {
        let frame = DataFrame::new(vec![Column::new("q1".into(), [1i64, 2, 2])])?;
        Ok(Dataset::new(frame))
    }
}

#[test]
fn custom_loader_is_dispatched_by_extension() {
    let mut registry = LoaderRegistry::with_defaults();
    registry.register(Box::new(FixedLoader));

    let dataset = registry.load(Path::new("wave1.sav")).unwrap();
    assert_eq!(dataset.height(), 3);
    assert_eq!(registry.extensions(), vec!["csv", "sav"]);
}
