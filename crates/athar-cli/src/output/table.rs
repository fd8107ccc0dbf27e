use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{flatten_scalars, format_scalar, lookup, result_object, SERIES_KEYS};

/// Headline figures as a field/value table, then one table per series.
///
/// The monthly schedule and raw Monte Carlo paths are too long for a
/// terminal and are only available as JSON.
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", format_scalar(value));
        return;
    };

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_scalars(result) {
        builder.push_record([key, format_scalar(&val)]);
    }
    println!("{}", Table::from(builder));

    for key in SERIES_KEYS {
        if let Some(Value::Array(rows)) = lookup(result, key) {
            println!("\n{key}:");
            print_rows(rows);
        }
    }

    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {meth}");
    }
}

fn print_rows(rows: &[Value]) {
    let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();
    let Some(first) = objects.first() else {
        println!("(empty)");
        return;
    };

    let headers: Vec<String> = first.keys().cloned().collect();
    let mut builder = Builder::default();
    builder.push_record(headers.clone());
    for map in objects {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(h).map(format_scalar).unwrap_or_default())
            .collect();
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}
