use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::kind::EventKind;

/// A single auxiliary value attached to an event.
///
/// Limited to JSON primitives so log lines stay flat. Numbers keep their
/// original JSON representation (`50` is not rewritten as `50.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Parse a CLI-style value: `true`/`false`, integers, floats, else text.
    pub fn parse_loose(s: &str) -> Self {
        match s {
            "true" => MetaValue::Bool(true),
            "false" => MetaValue::Bool(false),
            _ => {
                if let Ok(n) = s.parse::<i64>() {
                    MetaValue::Number(n.into())
                } else if let Some(n) = s
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                {
                    MetaValue::Number(n)
                } else {
                    MetaValue::Text(s.to_string())
                }
            }
        }
    }
}

impl From<MetaValue> for serde_json::Value {
    fn from(v: MetaValue) -> Self {
        match v {
            MetaValue::Bool(b) => serde_json::Value::Bool(b),
            MetaValue::Number(n) => serde_json::Value::Number(n),
            MetaValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

impl std::fmt::Display for MetaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{b}"),
            MetaValue::Number(n) => write!(f, "{n}"),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::Text(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::Text(s)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Number(n.into())
    }
}

impl From<u32> for MetaValue {
    fn from(n: u32) -> Self {
        MetaValue::Number(n.into())
    }
}

/// Auxiliary data keyed by name.
pub type Meta = BTreeMap<String, MetaValue>;

/// A validated event, not yet stamped with a timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackEvent {
    pub event: EventKind,
    pub from: String,
    pub to: Option<String>,
    pub meta: Option<Meta>,
}

impl TrackEvent {
    /// Attach the write-time timestamp, producing the persisted shape.
    pub fn stamp(self, ts: String) -> LoggedEvent {
        LoggedEvent {
            event: self.event.as_str().to_string(),
            from: self.from,
            to: self.to,
            meta: self.meta,
            ts,
        }
    }
}

/// One line of the event log: `{event, from, to?, meta?, ts}`.
///
/// `event` stays a plain string so lines written by older builds with kinds
/// this build no longer knows still parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedEvent {
    pub event: String,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub ts: String,
}

impl LoggedEvent {
    pub fn kind(&self) -> Option<EventKind> {
        self.event.parse().ok()
    }

    /// Parsed `ts`, if it is valid RFC 3339.
    pub fn timestamp(&self) -> Option<time::OffsetDateTime> {
        time::OffsetDateTime::parse(&self.ts, &time::format_description::well_known::Rfc3339).ok()
    }

    pub fn meta_value(&self, key: &str) -> Option<&MetaValue> {
        self.meta.as_ref().and_then(|m| m.get(key))
    }
}
