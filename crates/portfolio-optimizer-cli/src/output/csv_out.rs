use serde_json::Value;
use std::io;

/// Write output as CSV to stdout.
///
/// Object results become `field,value` rows. Arrays of objects (allocation
/// lines) become one row per element; arrays of arrays (a covariance matrix)
/// are written row for row.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let written = match result {
        Value::Object(map) => {
            let mut res = wtr.write_record(["field", "value"]);
            for (key, val) in map {
                if res.is_err() {
                    break;
                }
                res = wtr.write_record([key.as_str(), &format_csv_value(val)]);
            }
            res
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => wtr.write_record([&format_csv_value(result)]),
    };

    if let Err(e) = written.and_then(|_| wtr.flush().map_err(csv::Error::from)) {
        tracing::error!(error = %e, "CSV output failed");
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) -> csv::Result<()> {
    match arr.first() {
        Some(Value::Object(first)) => {
            let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
            wtr.write_record(&headers)?;
            for item in arr {
                if let Value::Object(map) = item {
                    let row: Vec<String> = headers
                        .iter()
                        .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                        .collect();
                    wtr.write_record(&row)?;
                }
            }
        }
        Some(Value::Array(_)) => {
            for item in arr {
                if let Value::Array(cells) = item {
                    let row: Vec<String> = cells.iter().map(format_csv_value).collect();
                    wtr.write_record(&row)?;
                }
            }
        }
        _ => {
            for item in arr {
                wtr.write_record([&format_csv_value(item)])?;
            }
        }
    }
    Ok(())
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
