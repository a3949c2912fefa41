use serde_json::Value;
use std::io;

use super::{format_value, result_object, row_field};

/// Write output as CSV to stdout: one line per installment (or issue) when
/// the result has rows, otherwise a two-column field/value listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let written = match result_object(value) {
        Some(result) => match row_field(result) {
            Some((_, rows)) => write_rows(&mut wtr, rows),
            None => write_fields(&mut wtr, result),
        },
        None => wtr.write_record([format_value(value)]),
    };

    if let Err(e) = written.and_then(|()| wtr.flush().map_err(csv::Error::from)) {
        eprintln!("CSV output error: {}", e);
    }
}

fn write_fields<W: io::Write>(
    wtr: &mut csv::Writer<W>,
    map: &serde_json::Map<String, Value>,
) -> csv::Result<()> {
    wtr.write_record(["field", "value"])?;
    for (key, val) in map {
        wtr.write_record([key.as_str(), &format_value(val)])?;
    }
    Ok(())
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> csv::Result<()> {
    let Some(Value::Object(first)) = rows.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;

    for row in rows {
        if let Value::Object(map) = row {
            wtr.write_record(
                headers
                    .iter()
                    .map(|h| map.get(*h).map(format_value).unwrap_or_default()),
            )?;
        }
    }
    Ok(())
}
