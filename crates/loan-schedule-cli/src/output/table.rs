use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{format_value, result_object, row_field};

/// Format output as tables: scalar fields as Field/Value pairs, then any
/// list of rows (installments, issues) as its own table.
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", format_value(value));
        return;
    };

    print_fields(result);

    if let Some((name, rows)) = row_field(result) {
        println!("\n{}:", title(name));
        print_rows(rows);
    }

    if let Some(envelope) = value.as_object() {
        print_warnings(envelope);
        if let Some(Value::String(meth)) = envelope.get("methodology") {
            println!("\nMethodology: {}", meth);
        }
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        if matches!(val, Value::Array(rows) if rows.first().is_some_and(Value::is_object)) {
            continue;
        }
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_rows(rows: &[Value]) {
    let Some(Value::Object(first)) = rows.first() else {
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();

    let mut builder = Builder::default();
    builder.push_record(&headers);
    for row in rows {
        if let Value::Object(map) = row {
            builder.push_record(
                headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default()),
            );
        }
    }
    println!("{}", Table::from(builder));
}

fn print_warnings(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }
}

fn title(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
        None => String::new(),
    }
}
