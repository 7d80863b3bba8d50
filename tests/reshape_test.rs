//! Integration tests for reshaping form JSON into rows

use fliix_helpers::utils::reshape::{convert_multi_line_json_array, reshape_json};
use serde_json::json;

#[test]
fn test_reshape_parallel_arrays() {
    let columns = json!({"a": [1, 2], "b": [3, 4]});
    let rows = convert_multi_line_json_array(columns.as_object().unwrap()).unwrap();
    assert_eq!(
        serde_json::to_value(rows).unwrap(),
        json!([{"a": 1, "b": 3}, {"a": 2, "b": 4}])
    );
}

#[test]
fn test_reshape_form_text() {
    let rows = reshape_json(r#"{"pos": ["A", "B", "C"], "qty": [1, 2, 3]}"#);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["pos"], "C");
    assert_eq!(rows[2]["qty"], 3);
}

#[test]
fn test_reshape_rejects_bad_input() {
    assert!(reshape_json("not json").is_empty());
    assert!(reshape_json(r#"{"pos": "A"}"#).is_empty());
}
