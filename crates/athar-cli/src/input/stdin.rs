use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Parameters piped on stdin, as JSON or YAML.
///
/// `None` when stdin is a terminal or carries only whitespace.
pub fn read_stdin<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    parse_piped(&buffer)
}

fn parse_piped<T: DeserializeOwned>(raw: &str) -> Result<Option<T>, Box<dyn std::error::Error>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // JSON is a subset of YAML, but its errors read better.
    if trimmed.starts_with('{') {
        let parsed = serde_json::from_str(trimmed)
            .map_err(|e| format!("Failed to parse stdin as JSON: {e}"))?;
        return Ok(Some(parsed));
    }
    let parsed =
        serde_yaml::from_str(trimmed).map_err(|e| format!("Failed to parse stdin as YAML: {e}"))?;
    Ok(Some(parsed))
}
