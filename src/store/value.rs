use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;

use super::DocumentPath;

/// Field name to value map; the body of a document.
pub type Fields = BTreeMap<String, Value>;

/// A single field value.
///
/// References are their own variant so that resolving them is an explicit
/// `match` rather than a runtime type test.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Timestamp(DateTime<Utc>),
    String(String),
    Array(Vec<Value>),
    Map(Fields),
    Reference(DocumentPath),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// JSON rendering used for `--full` output. References render as their path.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Double(d) => serde_json::Value::from(*d),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(fields) => fields_to_json(fields),
            Value::Reference(path) => serde_json::Value::String(path.to_string()),
        }
    }

    /// Short plain-text rendering for summary lines.
    pub fn display(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::String(s) => s.clone(),
            Value::Array(items) => items.iter().map(Value::display).collect::<Vec<_>>().join(","),
            Value::Reference(path) => path.to_string(),
            other => other.to_json().to_string(),
        }
    }
}

pub fn fields_to_json(fields: &Fields) -> serde_json::Value {
    serde_json::Value::Object(fields.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<DocumentPath> for Value {
    fn from(value: DocumentPath) -> Self {
        Value::Reference(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Value::Array(value.into_iter().map(Value::String).collect())
    }
}

/// A change to one field in an update.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldChange {
    Set(Value),
    Delete,
}

pub type Patch = BTreeMap<String, FieldChange>;

/// Apply `patch` to an in-memory document body.
pub fn apply_patch(fields: &mut Fields, patch: &Patch) {
    for (name, change) in patch {
        match change {
            FieldChange::Set(v) => {
                fields.insert(name.clone(), v.clone());
            }
            FieldChange::Delete => {
                fields.remove(name);
            }
        }
    }
}
