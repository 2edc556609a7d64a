use serde_json::Value;
use std::io;

use super::{is_record_array, scalar_text};

/// Record arrays, in the order a CSV export prefers them.
const ROW_KEYS: [&str; 5] = ["cash_flows", "rows", "outcomes", "entries", "details"];

/// Write output as CSV to stdout.
///
/// A result that is, or contains, a table of rows is written as that
/// table; anything else as two-column field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        Value::Object(map) => {
            let rows = ROW_KEYS
                .iter()
                .filter_map(|k| map.get(*k))
                .find(|v| is_record_array(v));
            match rows {
                Some(Value::Array(arr)) => write_array_csv(&mut wtr, arr),
                _ => {
                    let _ = wtr.write_record(["field", "value"]);
                    for (key, val) in map {
                        let _ = wtr.write_record([key.as_str(), &scalar_text(val)]);
                    }
                }
            }
        }
        other => {
            let _ = wtr.write_record([&scalar_text(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(scalar_text).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&scalar_text(item)]);
        }
    }
}
