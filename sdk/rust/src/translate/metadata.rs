//! Metadata fallback bucket.
//!
//! Every source key no other stage claimed lands here, so the translation
//! never drops information. That includes values that lost a collision in an
//! earlier stage.

use serde_json::{Map, Value as JsonValue};

use crate::config::TranslatorConfig;
use crate::keys;
use crate::value::{AttributeValue, OutputAttributes};

/// Keep primitives as-is and stringify structured values.
fn json_safe(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(_) | JsonValue::Object(_) => JsonValue::String(value.to_string()),
        _ => value.clone(),
    }
}

/// Store `value` under `key`, or under the first free `key#<n>` when `key`
/// already holds a different value. An identical value is stored once.
fn insert_unique(map: &mut Map<String, JsonValue>, key: &str, value: JsonValue) {
    let mut slot = key.to_string();
    let mut n = 0usize;
    loop {
        match map.get(&slot) {
            None => {
                map.insert(slot, value);
                return;
            }
            Some(existing) if *existing == value => return,
            Some(_) => {
                n += 1;
                slot = format!("{key}#{n}");
            }
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct MetadataBucket(Map<String, JsonValue>);

impl MetadataBucket {
    pub(super) fn insert(&mut self, key: &str, value: &JsonValue) {
        insert_unique(&mut self.0, key, json_safe(value));
    }

    #[cfg(test)]
    pub(super) fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.get(key)
    }

    /// Write the bucket as `metadata`.
    ///
    /// An existing `metadata` context attribute is never replaced. When it
    /// holds a JSON object the bucket is merged into it. Existing entries
    /// keep their keys and clashing bucket entries move to `key#<n>`.
    pub(super) fn emit(self, out: &mut OutputAttributes, config: &TranslatorConfig) {
        if self.0.is_empty() {
            return;
        }

        let Some(existing) = out.get(keys::METADATA) else {
            out.insert_if_absent(
                keys::METADATA,
                AttributeValue::String(JsonValue::Object(self.0).to_string()),
            );
            return;
        };

        let parsed = existing
            .as_str()
            .and_then(|s| serde_json::from_str::<JsonValue>(s).ok());
        let Some(JsonValue::Object(mut merged)) = parsed else {
            step!(
                config,
                entries = self.0.len(),
                "existing metadata is not an object, bucket not emitted"
            );
            return;
        };

        for (key, value) in self.0 {
            insert_unique(&mut merged, &key, value);
        }
        out.set(
            keys::METADATA,
            AttributeValue::String(JsonValue::Object(merged).to_string()),
        );
    }
}
