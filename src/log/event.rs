//! Schema for JSONL tracing events as emitted by the executor's JSON log
//! writer.
//!
//! Example line:
//! {"fields": {"message": "contract compilation finished", "time": 12.5},
//!  "spans": [{"name": "contract compilation", "class_hash": "0x1234"}],
//!  "span": {"name": "contract compilation", "class_hash": "0x1234"}}
//!
//! `spans` is the span stack, outermost first. `span` duplicates the
//! innermost entry when the writer includes it separately.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    #[serde(default)]
    pub fields: Fields,

    #[serde(default)]
    pub spans: Vec<Span>,

    #[serde(default)]
    pub span: Option<Span>,
}

/// Event payload: a message plus free-form measurements.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fields {
    #[serde(default)]
    pub message: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One span of enclosing context, with its recorded fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Span {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl LogEvent {
    /// First span whose name contains `name` (substring match).
    pub fn find_span(&self, name: &str) -> Option<&Span> {
        self.spans
            .iter()
            .find(|s| s.name.contains(name))
            .or_else(|| self.span.as_ref().filter(|s| s.name.contains(name)))
    }

    pub fn innermost_span(&self) -> Option<&Span> {
        self.span.as_ref().or_else(|| self.spans.last())
    }
}

impl Fields {
    /// Numeric measurement; accepts JSON numbers and numeric strings.
    pub fn number(&self, key: &str) -> Option<f64> {
        self.extra.get(key).and_then(value_to_f64)
    }
}

impl Span {
    pub fn number(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(value_to_f64)
    }

    /// String field; numbers are stringified (hashes sometimes arrive as
    /// bare decimal numbers).
    pub fn string(&self, key: &str) -> Option<String> {
        match self.fields.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
