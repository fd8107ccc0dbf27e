use serde_json::{Map, Value};
use std::io;

use super::{flatten_scalars, lookup, result_object, SERIES_KEYS};

/// Write the main year-by-year series as CSV, or field/value pairs when the
/// result has none.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let outcome = write_csv(&mut wtr, value).and_then(|()| wtr.flush().map_err(csv::Error::from));
    if let Err(e) = outcome {
        eprintln!("CSV write error: {e}");
    }
}

fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) -> Result<(), csv::Error> {
    let Some(result) = result_object(value) else {
        return wtr.write_record([raw(value)]);
    };

    let series = SERIES_KEYS
        .iter()
        .find_map(|k| lookup(result, k).and_then(Value::as_array))
        .filter(|rows| !rows.is_empty());

    match series {
        Some(rows) => write_rows(wtr, rows),
        None => {
            wtr.write_record(["field", "value"])?;
            for (key, val) in flatten_scalars(result) {
                wtr.write_record([key, raw(&val)])?;
            }
            Ok(())
        }
    }
}

fn write_rows<W: io::Write>(wtr: &mut csv::Writer<W>, rows: &[Value]) -> Result<(), csv::Error> {
    let objects: Vec<&Map<String, Value>> = rows.iter().filter_map(Value::as_object).collect();
    let Some(first) = objects.first() else {
        return Ok(());
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    wtr.write_record(&headers)?;
    for map in objects {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(raw).unwrap_or_default())
            .collect();
        wtr.write_record(&row)?;
    }
    Ok(())
}

/// Full-precision rendering; CSV is meant for further processing.
fn raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
