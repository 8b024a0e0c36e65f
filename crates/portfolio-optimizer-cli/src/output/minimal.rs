use serde_json::Value;

/// Fields printed by `--output minimal`, in priority order.
const PRIORITY_KEYS: [&str; 4] = [
    "sharpe_ratio",
    "optimal_weights",
    "expected_return",
    "volatility",
];

/// Print just the headline number of a result envelope.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        for key in PRIORITY_KEYS {
            if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                println!("{}", format_minimal(val));
                return;
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(items) => items
            .iter()
            .map(format_minimal)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_weights_join_with_commas() {
        assert_eq!(format_minimal(&json!(["0.4", "0.6"])), "0.4,0.6");
    }

    #[test]
    fn test_scalars() {
        assert_eq!(format_minimal(&json!("0.49")), "0.49");
        assert_eq!(format_minimal(&json!(100)), "100");
        assert_eq!(format_minimal(&Value::Null), "null");
    }
}
