//! Integration tests for request files and flag overrides.

use std::fs;

use xtab_cli::request::{RequestOverrides, assemble_request, read_request};
use xtab_model::{AxisSide, MissingPolicy, StatisticKind};

const REQUEST: &str = r#"{
    "row_vars": ["gender"],
    "col_vars": ["q5"],
    "weight": "w",
    "multiple_response": {"q5": {"type": "select_all", "options": ["tv", "radio"], "axis": "col"}},
    "statistics": ["chi-square", "phi-cramer"],
    "display": {"col_pct": true},
    "decimal_places": 2
}"#;

#[test]
fn test_read_request_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("request.json");
    fs::write(&path, REQUEST).unwrap();

    let request = read_request(&path).unwrap();

    assert_eq!(request.row_vars, vec!["gender"]);
    assert_eq!(request.weight.as_deref(), Some("w"));
    assert_eq!(request.multiple_response["q5"].axis, AxisSide::Column);
    assert!(request.display.col_pct);
    assert_eq!(request.decimal_places, 2);
    assert_eq!(request.missing, MissingPolicy::Exclude);
}

#[test]
fn test_flags_extend_request_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("request.json");
    fs::write(&path, REQUEST).unwrap();
    let overrides = RequestOverrides {
        rows: vec!["region".into()],
        statistics: vec!["fisher".into(), "chi-square".into()],
        hide_empty: true,
        level: Some(0.01),
        ..RequestOverrides::default()
    };

    let request = assemble_request(Some(read_request(&path).unwrap()), &overrides).unwrap();

    assert_eq!(request.row_vars, vec!["region"]);
    assert_eq!(request.col_vars, vec!["q5"]);
    assert_eq!(
        request.statistics,
        vec![
            StatisticKind::ChiSquare,
            StatisticKind::PhiCramer,
            StatisticKind::Fisher
        ]
    );
    assert!(request.hide_empty);
    assert!((request.significance.level - 0.01).abs() < f64::EPSILON);
}

#[test]
fn test_unreadable_request_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let error = read_request(&missing).unwrap_err();
    assert!(format!("{error:#}").contains("absent.json"));

    let broken = dir.path().join("broken.json");
    fs::write(&broken, "{\"row_vars\": 3}").unwrap();
    let error = read_request(&broken).unwrap_err();
    assert!(format!("{error:#}").contains("parse request file"));
}
