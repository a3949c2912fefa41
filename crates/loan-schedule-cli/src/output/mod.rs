pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of a computation envelope, or the value itself.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value)
        .as_object()
}

/// First field holding an array of objects, e.g. `installments` or `issues`.
pub(crate) fn row_field(map: &Map<String, Value>) -> Option<(&str, &[Value])> {
    map.iter().find_map(|(key, val)| match val {
        Value::Array(rows) if rows.first().is_some_and(Value::is_object) => {
            Some((key.as_str(), rows.as_slice()))
        }
        _ => None,
    })
}

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_object_unwraps_envelope() {
        let v = json!({"result": {"installment_count": 8}, "warnings": []});
        assert_eq!(result_object(&v).unwrap()["installment_count"], 8);

        let bare = json!({"loan_id": "LN-1"});
        assert_eq!(result_object(&bare).unwrap()["loan_id"], "LN-1");
    }

    #[test]
    fn test_row_field_finds_installments() {
        let v = json!({"total": "10", "installments": [{"number": 1}], "tags": ["a"]});
        let (name, rows) = row_field(v.as_object().unwrap()).unwrap();
        assert_eq!(name, "installments");
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("9333.33")), "9333.33");
        assert_eq!(format_value(&json!(null)), "");
        assert_eq!(format_value(&json!(["a", 1])), "a, 1");
    }
}
