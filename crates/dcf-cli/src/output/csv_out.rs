use serde_json::{Map, Value};
use std::io;

/// Row arrays exported as CSV, in order of preference.
const ROW_KEYS: [&str; 2] = ["rows", "discounted_cash_flows"];

/// Write output as CSV to stdout.
///
/// A result carrying a row array (forecast rows, discounted cash flows)
/// is written one record per row; anything else becomes a two-column
/// field/value listing with dotted paths for nested fields.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(rows) = find_row_array(map) {
                write_array_csv(&mut wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                let mut pairs = Vec::new();
                flatten_fields("", map, &mut pairs);
                for (key, val) in pairs {
                    let _ = wtr.write_record([key, val]);
                }
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

/// Locate a row array, looking into nested objects when the top level has none.
fn find_row_array(map: &Map<String, Value>) -> Option<&[Value]> {
    for key in ROW_KEYS {
        if let Some(Value::Array(arr)) = map.get(key) {
            return Some(arr.as_slice());
        }
    }
    map.values().find_map(|v| match v {
        Value::Object(inner) => find_row_array(inner),
        _ => None,
    })
}

fn flatten_fields(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten_fields(&path, inner, out),
            other => out.push((path, format_csv_value(other))),
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
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
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
