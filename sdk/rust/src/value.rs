//! Attribute value model.
//!
//! Source attributes are arbitrary JSON. Output attributes are scalars only:
//! anything structured is carried as compact JSON text.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

/// Source attribute set, in insertion order.
pub type SourceAttributes = serde_json::Map<String, JsonValue>;

/// A scalar output attribute value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl AttributeValue {
    /// Coerce a JSON value to a scalar.
    ///
    /// Null, arrays and objects become their compact JSON text. Numbers that
    /// do not fit `i64` become `Float`.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                    Self::Float(f)
                } else {
                    Self::String(n.to_string())
                }
            }
            JsonValue::String(s) => Self::String(s.clone()),
            JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => {
                Self::String(value.to_string())
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Convert back to JSON, keeping the scalar type.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Float(f) => JsonValue::from(*f),
            Self::String(s) => JsonValue::String(s.clone()),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// Translated attribute set.
///
/// Keys are unique and kept sorted so that output is deterministic. Writers
/// go through [`insert_if_absent`](Self::insert_if_absent): the first stage
/// to claim a key keeps it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OutputAttributes(BTreeMap<String, AttributeValue>);

impl OutputAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless the key is already set.
    ///
    /// Returns `true` when the value was stored.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: AttributeValue) -> bool {
        match self.0.entry(key.into()) {
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(value);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Replace the value of an existing key or add it.
    pub(crate) fn set(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(AttributeValue::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.0.iter()
    }
}

impl IntoIterator for OutputAttributes {
    type Item = (String, AttributeValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
