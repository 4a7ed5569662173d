//! Tests for xtab-model wire types.

use xtab_model::{
    AxisSide, Comparator, Connective, CrosstabRequest, CustomVariable, MissingPolicy,
    StatisticKind,
};

#[test]
fn full_request_deserializes() {
    let json = r#"{
        "row_vars": ["gender"],
        "col_vars": ["brands"],
        "weight": "wt",
        "filter": [{"column": "age", "comparator": "greater_than", "value": 17}],
        "multiple_response": {"brands": {"type": "select_all", "options": ["A", "B"], "axis": "column"}},
        "custom_variables": [{
            "name": "young_female",
            "conditions": [
                {"column": "age", "comparison": "less_than", "value": "30"},
                {"column": "gender", "comparison": "equals", "value": "F", "operator": "AND"}
            ]
        }],
        "statistics": ["chi-square", "phi-cramer", "fisher"],
        "display": {"row_pct": true},
        "significance": {"enable": true, "level": 0.01},
        "decimal_places": 2,
        "missing": "include",
        "hide_empty": true
    }"#;
    let request: CrosstabRequest = serde_json::from_str(json).expect("deserialize request");

    assert_eq!(request.weight.as_deref(), Some("wt"));
    assert_eq!(request.filter[0].comparator, Comparator::GreaterThan);
    assert_eq!(request.filter[0].value, "17");
    assert_eq!(request.multiple_response["brands"].axis, AxisSide::Column);
    assert_eq!(request.custom_variables[0].conditions[1].operator, Connective::And);
    assert!(request.wants(StatisticKind::Fisher));
    assert!(request.display.row_pct && !request.display.col_pct);
    assert_eq!(request.decimal_places, 2);
    assert_eq!(request.missing, MissingPolicy::Include);
    assert!(!request.continuity_correction);
}

#[test]
fn unknown_statistic_is_rejected() {
    let json = r#"{"row_vars": ["a"], "col_vars": ["b"], "statistics": ["anova"]}"#;
    assert!(serde_json::from_str::<CrosstabRequest>(json).is_err());
}

#[test]
fn unknown_comparator_is_rejected() {
    let json = r#"{"name": "x", "conditions": [{"column": "a", "comparator": "between", "value": 1}]}"#;
    assert!(serde_json::from_str::<CustomVariable>(json).is_err());
}

#[test]
fn request_serializes_statistics_with_wire_names() {
    let request = CrosstabRequest::new(["q1"], ["q2"])
        .with_statistics([StatisticKind::ChiSquare, StatisticKind::Contingency]);
    let value = serde_json::to_value(&request).expect("serialize request");
    assert_eq!(value["statistics"], serde_json::json!(["chi-square", "contingency"]));
    assert_eq!(value["missing"], "exclude");
}
