//! Event records: one JSON object per line in the session file.
//!
//! Wire shape: `{"type": str, "timestamp": f64, "sender": str, "payload": any}`.
//! Keys this version does not know about are kept in [`Event::extra`] so a
//! record from a newer peer survives a read unchanged. Envelope fields of
//! an unexpected JSON type are coerced rather than rejected: any JSON
//! object is a deliverable record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Announced by the host after creating the session file. Payload `{code}`.
pub const SESSION_CREATED: &str = "session_created";
/// Announced by a guest after joining. Payload `{code}`.
pub const SESSION_JOINED: &str = "session_joined";
/// Announced by either side on disconnect. Payload `{}`.
pub const SESSION_LEFT: &str = "session_left";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub event_type: String,
    /// Wall-clock epoch seconds at publish time, sub-second precision.
    /// `0.0` when the record carried something other than a number.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub timestamp: f64,
    #[serde(default, deserialize_with = "lenient_string")]
    pub sender: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    /// Build an event stamped with the current time.
    pub fn new(event_type: impl Into<String>, sender: impl Into<String>, payload: Value) -> Self {
        Self::at(Utc::now(), event_type, sender, payload)
    }

    /// Build an event stamped with `now`.
    pub fn at(
        now: DateTime<Utc>,
        event_type: impl Into<String>,
        sender: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            timestamp: epoch_seconds(now),
            sender: sender.into(),
            payload,
            extra: Map::new(),
        }
    }

    /// True for the announcements the session lifecycle emits itself.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self.event_type.as_str(),
            SESSION_CREATED | SESSION_JOINED | SESSION_LEFT
        )
    }

    /// The timestamp as a UTC datetime, if it is finite and in range.
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        if !self.timestamp.is_finite() {
            return None;
        }
        #[expect(clippy::cast_possible_truncation)]
        let micros = (self.timestamp * 1_000_000.0).round() as i64;
        DateTime::from_timestamp_micros(micros)
    }

    /// Serialize as a single newline-terminated JSON line.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Parse one line (without its terminator). `None` for anything that is
    /// not a JSON object.
    pub fn parse_line(line: &[u8]) -> Option<Self> {
        serde_json::from_slice(line).ok()
    }
}

/// Strings pass through, `null` becomes `""`, anything else its JSON text.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Numbers pass through, anything else becomes `0.0`.
fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Value::deserialize(deserializer)?.as_f64().unwrap_or(0.0))
}

fn epoch_seconds(now: DateTime<Utc>) -> f64 {
    #[expect(clippy::cast_precision_loss)]
    let micros = now.timestamp_micros() as f64;
    micros / 1_000_000.0
}
