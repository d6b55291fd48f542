//! Index document representation
//!
//! A document is a flat map from physical field name to one or more
//! primitive values. It is the only shape the index client sees.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ID_FIELD;

/// A primitive value stored in an index field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Long(i64),
    Double(f64),
    Date(DateTime<Utc>),
    Binary(#[serde(with = "base64_bytes")] Vec<u8>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Orders two values of comparable kinds; numbers compare across widths.
    pub fn compare(&self, other: &FieldValue) -> Option<Ordering> {
        match (self, other) {
            (FieldValue::Text(a), FieldValue::Text(b)) => Some(a.cmp(b)),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => Some(a.cmp(b)),
            (FieldValue::Long(a), FieldValue::Long(b)) => Some(a.cmp(b)),
            (FieldValue::Long(a), FieldValue::Double(b)) => (*a as f64).partial_cmp(b),
            (FieldValue::Double(a), FieldValue::Long(b)) => a.partial_cmp(&(*b as f64)),
            (FieldValue::Double(a), FieldValue::Double(b)) => a.partial_cmp(b),
            (FieldValue::Date(a), FieldValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Query-syntax literal for this value.
    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(s) => format!("\"{}\"", escape_quoted(s)),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Long(v) => v.to_string(),
            FieldValue::Double(v) => format!("{:?}", v),
            FieldValue::Date(d) => format!("\"{}\"", d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            FieldValue::Binary(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

fn escape_quoted(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A document in the index's native shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndexDocument {
    fields: BTreeMap<String, Vec<FieldValue>>,
}

impl IndexDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_value(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.entry(field.into()).or_default().push(value);
    }

    pub fn set_value(&mut self, field: impl Into<String>, value: FieldValue) {
        self.fields.insert(field.into(), vec![value]);
    }

    pub fn values(&self, field: &str) -> &[FieldValue] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, field: &str) -> Option<&FieldValue> {
        self.values(field).first()
    }

    /// Value of the unique-key field.
    pub fn id(&self) -> Option<&str> {
        self.first(ID_FIELD).and_then(FieldValue::as_text)
    }

    pub fn contains_field(&self, field: &str) -> bool {
        !self.values(field).is_empty()
    }

    /// Fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Vec<FieldValue>)> {
        self.fields.iter()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}
