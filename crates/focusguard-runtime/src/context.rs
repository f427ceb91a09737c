//! Input/output helpers for the CLI: code normalization, stdin command
//! parsing, event rendering.

use anyhow::bail;
use chrono::Local;
use focusguard_collab::{Event, is_valid_code};
use serde_json::{Value, json};

use crate::cli::OutputFormat;

/// Upper-case and validate a user-supplied session code.
pub fn normalize_code(raw: &str) -> anyhow::Result<String> {
    let code = raw.trim().to_ascii_uppercase();
    if !is_valid_code(&code) {
        bail!("invalid session code {raw:?}: expected at least 4 characters from A-Z and 0-9");
    }
    Ok(code)
}

/// Parse a stdin line `<type> [payload]` into an event to publish.
///
/// The payload is parsed as JSON when possible, otherwise kept as a string.
/// A missing payload becomes `{}`. Blank lines yield `None`.
pub fn parse_publish_line(line: &str) -> Option<(String, Value)> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (event_type, rest) = match line.split_once(char::is_whitespace) {
        Some((event_type, rest)) => (event_type, rest.trim()),
        None => (line, ""),
    };
    let payload = if rest.is_empty() {
        json!({})
    } else {
        serde_json::from_str(rest).unwrap_or_else(|_| Value::String(rest.to_owned()))
    };
    Some((event_type.to_owned(), payload))
}

/// First 8 characters of a sender id.
pub fn short_sender(sender: &str) -> &str {
    sender.get(..8).unwrap_or(sender)
}

/// Render one received event for stdout.
pub fn format_event(event: &Event, format: OutputFormat) -> Result<String, serde_json::Error> {
    match format {
        OutputFormat::Json => serde_json::to_string(event),
        OutputFormat::Text => {
            let time = event.timestamp_utc().map_or_else(
                || "--:--:--".to_owned(),
                |ts| ts.with_timezone(&Local).format("%H:%M:%S").to_string(),
            );
            let payload = serde_json::to_string(&event.payload)?;
            Ok(format!(
                "{time} {} {} {payload}",
                short_sender(&event.sender),
                event.event_type
            ))
        }
    }
}
