pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Render a value as one cell.
///
/// Tagged coverage / payback values collapse to their number, or to their
/// kind when there is none ("unconstrained", "not_recovered_within_horizon").
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Object(map) => match map.get("kind") {
            Some(Value::String(kind)) => map
                .iter()
                .find(|(k, _)| k.as_str() != "kind")
                .map(|(_, v)| scalar_text(v))
                .unwrap_or_else(|| kind.clone()),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
        Value::Array(arr) => arr.iter().map(scalar_text).collect::<Vec<_>>().join(", "),
    }
}

/// True for a non-empty array whose first element is an object.
pub fn is_record_array(value: &Value) -> bool {
    matches!(value, Value::Array(arr) if matches!(arr.first(), Some(Value::Object(_))))
}
