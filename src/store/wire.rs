//! Firestore REST v1 JSON representation of documents and values.
//!
//! The same encoding is used for the on-disk documents of the local store, so a
//! local tree can be inspected with the Firestore documentation at hand.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Document, DocumentPath, Fields, StoreError, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WireValue {
    NullValue(()),
    BooleanValue(bool),
    // int64 travels as a decimal string
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(DateTime<Utc>),
    StringValue(String),
    ReferenceValue(String),
    ArrayValue(WireArray),
    MapValue(WireMap),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireArray {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<WireValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireMap {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, WireValue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, WireValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    #[serde(default)]
    pub documents: Vec<WireDocument>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCollectionIdsResponse {
    #[serde(default)]
    pub collection_ids: Vec<String>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Converts between [`Value`] and [`WireValue`].
///
/// Reference values carry fully qualified resource names
/// (`projects/{p}/databases/(default)/documents/users/u1`), so the codec needs
/// to know the documents root of the database it talks to.
#[derive(Debug, Clone)]
pub struct Codec {
    documents_root: String,
}

impl Codec {
    pub fn new(documents_root: impl Into<String>) -> Self {
        Codec {
            documents_root: documents_root.into(),
        }
    }

    pub fn for_project(project_id: &str) -> Self {
        Self::new(format!("projects/{project_id}/databases/(default)/documents"))
    }

    pub fn documents_root(&self) -> &str {
        &self.documents_root
    }

    pub fn resource_name(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.documents_root, path)
    }

    /// Strip the documents root from a resource name.
    pub fn path_from_name(&self, name: &str) -> Result<DocumentPath, StoreError> {
        let relative = name
            .strip_prefix(self.documents_root.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StoreError::Decode {
                path: name.to_string(),
                message: "not a document resource name".to_string(),
            })?;
        DocumentPath::parse(relative)
    }

    pub fn encode_value(&self, value: &Value) -> WireValue {
        match value {
            Value::Null => WireValue::NullValue(()),
            Value::Bool(b) => WireValue::BooleanValue(*b),
            Value::Integer(i) => WireValue::IntegerValue(i.to_string()),
            Value::Double(d) => WireValue::DoubleValue(*d),
            Value::Timestamp(ts) => WireValue::TimestampValue(*ts),
            Value::String(s) => WireValue::StringValue(s.clone()),
            Value::Array(items) => WireValue::ArrayValue(WireArray {
                values: items.iter().map(|v| self.encode_value(v)).collect(),
            }),
            Value::Map(fields) => WireValue::MapValue(WireMap {
                fields: self.encode_fields(fields),
            }),
            Value::Reference(path) => WireValue::ReferenceValue(self.resource_name(path)),
        }
    }

    pub fn encode_fields(&self, fields: &Fields) -> BTreeMap<String, WireValue> {
        fields.iter().map(|(k, v)| (k.clone(), self.encode_value(v))).collect()
    }

    pub fn decode_value(&self, value: WireValue) -> Result<Value, StoreError> {
        Ok(match value {
            WireValue::NullValue(()) => Value::Null,
            WireValue::BooleanValue(b) => Value::Bool(b),
            WireValue::IntegerValue(s) => Value::Integer(s.parse().map_err(|_| StoreError::Decode {
                path: s.clone(),
                message: "integerValue is not an int64".to_string(),
            })?),
            WireValue::DoubleValue(d) => Value::Double(d),
            WireValue::TimestampValue(ts) => Value::Timestamp(ts),
            WireValue::StringValue(s) => Value::String(s),
            WireValue::ReferenceValue(name) => Value::Reference(self.path_from_name(&name)?),
            WireValue::ArrayValue(arr) => Value::Array(
                arr.values
                    .into_iter()
                    .map(|v| self.decode_value(v))
                    .collect::<Result<_, _>>()?,
            ),
            WireValue::MapValue(map) => Value::Map(self.decode_fields(map.fields)?),
        })
    }

    pub fn decode_fields(&self, fields: BTreeMap<String, WireValue>) -> Result<Fields, StoreError> {
        fields
            .into_iter()
            .map(|(k, v)| Ok((k, self.decode_value(v)?)))
            .collect()
    }

    pub fn decode_document(&self, doc: WireDocument) -> Result<Document, StoreError> {
        let name = doc.name.ok_or_else(|| StoreError::Decode {
            path: self.documents_root.clone(),
            message: "document without a name".to_string(),
        })?;
        Ok(Document {
            path: self.path_from_name(&name)?,
            fields: self.decode_fields(doc.fields)?,
            update_time: doc.update_time,
        })
    }
}

/// Deserialize JSON, reporting the path of the offending element on failure.
pub fn from_json<T: DeserializeOwned>(body: &str) -> Result<T, StoreError> {
    let de = &mut serde_json::Deserializer::from_str(body);
    serde_path_to_error::deserialize(de).map_err(|e| StoreError::Json {
        path: e.path().to_string(),
        source: e.into_inner(),
    })
}
