use serde_json::Value;

/// Print the envelope as JSON: indented on a terminal, one line when piped.
pub fn print_json(value: &Value) {
    match render(value, atty::is(atty::Stream::Stdout)) {
        Ok(s) => println!("{}", s),
        Err(e) => tracing::error!(error = %e, "JSON serialization failed"),
    }
}

fn render(value: &Value, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_piped_output_is_one_line() {
        let env = json!({"result": {"optimal_weights": ["0.477", "0.523"]}, "warnings": []});
        let line = render(&env, false).unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&line).unwrap(), env);
        assert!(render(&env, true).unwrap().contains('\n'));
    }
}
