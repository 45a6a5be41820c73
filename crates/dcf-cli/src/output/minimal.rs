use serde_json::{Map, Value};

/// Headline fields, in order of priority.
const PRIORITY_KEYS: [&str; 5] = [
    "enterprise_value",
    "wacc",
    "pv_fcff",
    "cost_of_equity",
    "fcff",
];

/// Objects searched for a headline when the top level has none.
const NESTED_KEYS: [&str; 3] = ["valuation", "wacc", "assumptions"];

/// Print just the key answer value from the output.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", headline(result_obj));
}

fn headline(result: &Value) -> String {
    let Value::Object(map) = result else {
        return format_minimal(result);
    };

    if let Some(val) = priority_value(map) {
        return format_minimal(val);
    }

    for key in NESTED_KEYS {
        if let Some(Value::Object(inner)) = map.get(key) {
            if let Some(val) = priority_value(inner) {
                return format_minimal(val);
            }
        }
    }

    // Forecast table: final-year FCFF
    if let Some(Value::Array(rows)) = map.get("rows") {
        if let Some(Value::Object(last)) = rows.last() {
            if let Some(val) = last.get("fcff") {
                return format_minimal(val);
            }
        }
    }

    match map.iter().next() {
        Some((key, val)) => format!("{}: {}", key, format_minimal(val)),
        None => String::new(),
    }
}

fn priority_value(map: &Map<String, Value>) -> Option<&Value> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null() && !val.is_object())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
