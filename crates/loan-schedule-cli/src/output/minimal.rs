use serde_json::Value;

use super::{format_value, result_object};

/// Print just the key answer value from the output.
///
/// For a schedule this is the derived side of the plan: the installment
/// count in amount mode, the installment amount in count mode.
pub fn print_minimal(value: &Value) {
    let Some(map) = result_object(value) else {
        println!("{}", format_value(value));
        return;
    };

    let derived = match map.get("mode").and_then(Value::as_str) {
        Some("ByInstallmentAmount") => Some("installment_count"),
        Some(_) => Some("installment_amount"),
        None => None,
    };

    let priority_keys = ["valid", "installment_amount", "loan_id", "total_repayable"];

    for key in derived.iter().chain(priority_keys.iter()) {
        if let Some(val) = map.get(*key).filter(|v| !v.is_null()) {
            println!("{}", format_value(val));
            return;
        }
    }

    if let Some((key, val)) = map.iter().next() {
        println!("{}: {}", key, format_value(val));
    }
}
