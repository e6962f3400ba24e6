use serde_json::Value;
use std::io::{self, Read};

/// Read piped input, if any. Returns None when stdin is an interactive TTY.
/// YAML is a superset of JSON, so one parser covers both formats.
pub fn read_stdin() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value = serde_yaml::from_str(trimmed)?;
    Ok(Some(value))
}
