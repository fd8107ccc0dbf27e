pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Row arrays in the order they are preferred as the main series. Dotted
/// keys reach into nested objects.
pub(crate) const SERIES_KEYS: [&str; 7] = [
    "points",
    "series",
    "yearly_balances",
    "expected_path.points",
    "goals",
    "breakdown",
    "positions",
];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// The `result` object of the envelope, or the value itself.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    value
        .get("result")
        .unwrap_or(value)
        .as_object()
}

/// Follow a dotted key such as `summary.median` through nested objects.
pub(crate) fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let first = parts.next().and_then(|p| map.get(p));
    parts.fold(first, |acc, part| acc.and_then(|v| v.get(part)))
}

/// Scalar fields of `map`, nested objects flattened as `parent.child`.
/// Arrays are left to the series formatters.
pub(crate) fn flatten_scalars(map: &Map<String, Value>) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    for (key, val) in map {
        match val {
            Value::Array(_) => {}
            Value::Object(inner) => {
                for (child, v) in flatten_scalars(inner) {
                    out.push((format!("{key}.{child}"), v));
                }
            }
            _ => out.push((key.clone(), val.clone())),
        }
    }
    out
}

/// Render a scalar for display; floats are rounded to cents.
pub(crate) fn format_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format!("{f:.2}"),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
