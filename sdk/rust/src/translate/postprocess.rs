//! Derived defaults and composite `input.value` / `output.value`.

use serde_json::{Value as JsonValue, json};

use crate::config::TranslatorConfig;
use crate::keys;
use crate::value::{AttributeValue, OutputAttributes};

use super::mapping::SpanKind;

const FIRST_INPUT_ROLE: &str = "llm.input_messages.0.message.role";
const FIRST_INPUT_CONTENT: &str = "llm.input_messages.0.message.content";
const FIRST_OUTPUT_ROLE: &str = "llm.output_messages.0.message.role";
const FIRST_OUTPUT_CONTENT: &str = "llm.output_messages.0.message.content";
const FIRST_OUTPUT_FINISH_REASON: &str = "llm.output_messages.0.message.finish_reason";

/// Source values the derivations need that do not survive into the output
/// under a stable key.
#[derive(Debug, Default)]
pub(super) struct Resolved {
    request_model: Option<JsonValue>,
    response_id: Option<JsonValue>,
    pub(super) max_tokens: Option<JsonValue>,
}

impl Resolved {
    pub(super) fn observe(&mut self, key: &str, value: &JsonValue) {
        if keys::REQUEST_MODEL_KEYS.contains(&key) && self.request_model.is_none() {
            self.request_model = Some(value.clone());
        } else if key == keys::GEN_AI_RESPONSE_ID && self.response_id.is_none() {
            self.response_id = Some(value.clone());
        }
    }

    fn model(&self, out: &OutputAttributes) -> Option<JsonValue> {
        out.get(keys::LLM_MODEL_NAME)
            .map(AttributeValue::to_json)
            .or_else(|| self.request_model.clone())
    }
}

fn json_or_null(out: &OutputAttributes, key: &str) -> JsonValue {
    out.get(key).map_or(JsonValue::Null, AttributeValue::to_json)
}

fn role_or(out: &OutputAttributes, key: &str, default: &str) -> JsonValue {
    out.get(key)
        .map_or_else(|| JsonValue::from(default), AttributeValue::to_json)
}

fn total_tokens(out: &OutputAttributes) -> JsonValue {
    if let Some(total) = out.get(keys::LLM_TOKEN_COUNT_TOTAL) {
        return total.to_json();
    }
    let prompt = out.get(keys::LLM_TOKEN_COUNT_PROMPT).and_then(AttributeValue::as_i64);
    let completion = out
        .get(keys::LLM_TOKEN_COUNT_COMPLETION)
        .and_then(AttributeValue::as_i64);
    match (prompt, completion) {
        (Some(p), Some(c)) => JsonValue::from(p.saturating_add(c)),
        _ => JsonValue::Null,
    }
}

fn insert_composite(out: &mut OutputAttributes, key: &str, mime_key: &str, value: JsonValue) -> bool {
    if !out.insert_if_absent(key, AttributeValue::String(value.to_string())) {
        return false;
    }
    out.insert_if_absent(mime_key, AttributeValue::from(keys::MIME_JSON));
    true
}

/// Apply every derivation. Each one only fills keys that are still absent.
pub(super) fn apply(out: &mut OutputAttributes, resolved: &Resolved, config: &TranslatorConfig) {
    if let Some(system) = out.get_str(keys::LLM_SYSTEM) {
        let provider = system.to_lowercase();
        if out.insert_if_absent(keys::LLM_PROVIDER, AttributeValue::String(provider)) {
            step!(config, "llm.provider derived from llm.system");
        }
    }

    if (out.contains_key(keys::LLM_MODEL_NAME) || resolved.request_model.is_some())
        && out.insert_if_absent(
            keys::OPENINFERENCE_SPAN_KIND,
            AttributeValue::from(SpanKind::Llm.as_str()),
        )
    {
        step!(config, "span kind defaulted to LLM");
    }

    let model = resolved.model(out);

    if let Some(content) = out.get(FIRST_INPUT_CONTENT).map(AttributeValue::to_json)
        && let Some(model) = model.clone()
    {
        let input = json!({
            "messages": [{
                "role": role_or(out, FIRST_INPUT_ROLE, "user"),
                "content": content,
            }],
            "model": model,
            "max_tokens": resolved.max_tokens.clone().unwrap_or(JsonValue::Null),
        });
        if insert_composite(out, keys::INPUT_VALUE, keys::INPUT_MIME_TYPE, input) {
            step!(config, "input.value built from first input message");
        }
    }

    if let Some(content) = out.get(FIRST_OUTPUT_CONTENT).map(AttributeValue::to_json) {
        let output = json!({
            "id": resolved.response_id.clone().unwrap_or(JsonValue::Null),
            "choices": [{
                "finish_reason": json_or_null(out, FIRST_OUTPUT_FINISH_REASON),
                "index": 0,
                "message": {
                    "content": content,
                    "role": role_or(out, FIRST_OUTPUT_ROLE, "assistant"),
                    "refusal": null,
                    "annotations": [],
                },
            }],
            "model": model.unwrap_or(JsonValue::Null),
            "usage": {
                "prompt_tokens": json_or_null(out, keys::LLM_TOKEN_COUNT_PROMPT),
                "completion_tokens": json_or_null(out, keys::LLM_TOKEN_COUNT_COMPLETION),
                "total_tokens": total_tokens(out),
            },
        });
        if insert_composite(out, keys::OUTPUT_VALUE, keys::OUTPUT_MIME_TYPE, output) {
            step!(config, "output.value built from first output message");
        }
    }
}
