use serde_json::Value;

use super::scalar_text;

/// Headline field for each kind of result, in order of priority.
const PRIORITY_KEYS: [&str; 6] = [
    "grade",
    "npv",
    "probability_weighted_npv",
    "most_sensitive",
    "total_interest_paid",
    "free_cash_flow",
];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        // Both grading views: one letter each
        if let (Some(additive), Some(weighted)) = (map.get("additive"), map.get("scale_weighted")) {
            println!(
                "additive: {}, scale_weighted: {}",
                scalar_text(&additive["grade"]),
                scalar_text(&weighted["grade"])
            );
            return;
        }

        for key in &PRIORITY_KEYS {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", scalar_text(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar_text(val));
            return;
        }
    }

    // Cash-flow table: the cumulative NPV of the final year
    if let Value::Array(rows) = result_obj {
        if let Some(last) = rows.last() {
            println!("{}", scalar_text(&last["cumulative_npv"]));
            return;
        }
    }

    println!("{}", scalar_text(result_obj));
}
