//! Invocation parameter aggregation.

use serde_json::{Map, Value as JsonValue};

use crate::keys;
use crate::value::{AttributeValue, OutputAttributes};

use super::tools::is_tool_key;

/// Parameter name for a request configuration key: its last path segment.
pub(super) fn parameter_name(key: &str) -> Option<&str> {
    if is_tool_key(key) {
        return None;
    }
    let is_parameter = keys::INVOCATION_PARAMETER_KEYS.contains(&key)
        || key.starts_with(keys::GEN_AI_REQUEST_PREFIX)
        || key.starts_with(keys::LLM_REQUEST_PREFIX);
    if !is_parameter {
        return None;
    }
    key.rsplit('.').next().filter(|name| !name.is_empty())
}

/// Request parameters collected across the whole source set.
#[derive(Debug, Default)]
pub(super) struct InvocationParameters(Map<String, JsonValue>);

impl InvocationParameters {
    /// Store a parameter. A name that is already taken is refused so that
    /// the caller can route the value elsewhere.
    pub(super) fn insert(&mut self, name: &str, value: &JsonValue) -> bool {
        if self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), value.clone());
        true
    }

    pub(super) fn get(&self, name: &str) -> Option<&JsonValue> {
        self.0.get(name)
    }

    /// Write `llm.invocation_parameters` as a JSON object, if any were seen.
    pub(super) fn emit(self, out: &mut OutputAttributes) {
        if self.0.is_empty() {
            return;
        }
        out.insert_if_absent(
            keys::LLM_INVOCATION_PARAMETERS,
            AttributeValue::String(JsonValue::Object(self.0).to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parameter_name_prefixes() {
        assert_eq!(parameter_name("gen_ai.request.temperature"), Some("temperature"));
        assert_eq!(parameter_name("llm.request.max_tokens"), Some("max_tokens"));
        assert_eq!(parameter_name("llm.top_k"), Some("top_k"));
        assert_eq!(parameter_name("llm.chat.stop_sequences"), Some("stop_sequences"));
    }

    #[test]
    fn test_parameter_name_excludes_tool_keys() {
        assert_eq!(parameter_name("llm.request.functions"), None);
        assert_eq!(parameter_name("llm.request.functions.0.name"), None);
        assert_eq!(parameter_name("llm.request.tools"), None);
    }

    #[test]
    fn test_parameter_name_unrelated_key() {
        assert_eq!(parameter_name("gen_ai.system"), None);
        assert_eq!(parameter_name("llm.is_streaming_extra"), None);
    }

    #[test]
    fn test_insert_refuses_duplicate_names() {
        let mut params = InvocationParameters::default();
        assert!(params.insert("max_tokens", &json!(100)));
        assert!(!params.insert("max_tokens", &json!(200)));
        assert_eq!(params.get("max_tokens"), Some(&json!(100)));
    }

    #[test]
    fn test_emit_json_object() {
        let mut params = InvocationParameters::default();
        params.insert("temperature", &json!(0.7));
        params.insert("stop_sequences", &json!(["\n"]));
        let mut out = OutputAttributes::new();
        params.emit(&mut out);
        assert_eq!(
            out.get_str("llm.invocation_parameters"),
            Some(r#"{"temperature":0.7,"stop_sequences":["\n"]}"#)
        );
    }

    #[test]
    fn test_emit_nothing_when_empty() {
        let mut out = OutputAttributes::new();
        InvocationParameters::default().emit(&mut out);
        assert!(out.is_empty());
    }
}
