// ABOUTME: Small string helpers shared by the client and the CLI
// ABOUTME: Log-safe truncation, key=value parsing and JSON-ish value coercion

use serde_json::Value;

pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.len() <= max_chars {
        return s.to_string();
    }

    // Find a valid UTF-8 boundary at or before max_chars
    let mut boundary = max_chars;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }

    if boundary == 0 {
        return String::new();
    }

    format!("{}...", &s[..boundary])
}

/// Splits `key=value`, trimming whitespace around both halves.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected key=value, got '{}'", s))?;

    let key = key.trim();
    if key.is_empty() {
        return Err("Key must not be empty".into());
    }

    Ok((key.to_string(), value.trim().to_string()))
}

/// Interprets a CLI value as JSON when it parses, otherwise as a plain string.
pub fn coerce_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
