//! Parallel-array reshaping
//!
//! Forms post their repeated fields as one array per field
//! (`{"name": ["a", "b"], "qty": [1, 2]}`). The functions here turn that
//! into one object per row.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReshapeError {
    #[error("field '{0}' is not an array")]
    NotAnArray(String),
}

/// Converts a map of parallel arrays into a list of row objects
///
/// The row count is the length of the first field's array. Each row holds
/// every field, in input order, mapped to the value at that row's index.
/// Arrays shorter than the first one contribute `null`.
///
/// # Errors
/// Returns `ReshapeError::NotAnArray` if any field is not an array.
pub fn convert_multi_line_json_array(
    columns: &Map<String, Value>,
) -> Result<Vec<Map<String, Value>>, ReshapeError> {
    let mut arrays = Vec::with_capacity(columns.len());
    for (field, value) in columns {
        let values = value
            .as_array()
            .ok_or_else(|| ReshapeError::NotAnArray(field.clone()))?;
        arrays.push((field, values));
    }

    let total = arrays.first().map_or(0, |(_, values)| values.len());

    let rows = (0..total)
        .map(|i| {
            arrays
                .iter()
                .map(|(field, values)| {
                    let value = values.get(i).cloned().unwrap_or(Value::Null);
                    ((*field).clone(), value)
                })
                .collect::<Map<String, Value>>()
        })
        .collect();

    Ok(rows)
}

/// Parses `text` as a JSON object of parallel arrays and reshapes it
///
/// Returns an empty list if the text is not a JSON object or cannot be
/// reshaped.
pub fn reshape_json(text: &str) -> Vec<Map<String, Value>> {
    let columns = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(columns)) => columns,
        Ok(_) => {
            tracing::debug!("Expected a JSON object of arrays");
            return Vec::new();
        }
        Err(e) => {
            tracing::debug!("Invalid JSON: {}", e);
            return Vec::new();
        }
    };

    convert_multi_line_json_array(&columns).unwrap_or_else(|e| {
        tracing::debug!("Cannot reshape JSON: {}", e);
        Vec::new()
    })
}

/// Returns `true` if `text` is a complete JSON document
pub fn is_json(text: &str) -> bool {
    serde_json::from_str::<serde::de::IgnoredAny>(text).is_ok()
}
