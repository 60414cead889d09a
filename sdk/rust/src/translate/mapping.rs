//! Direct key remapping.

use serde_json::Value as JsonValue;

use crate::keys;
use crate::value::AttributeValue;

/// One-to-one key translations. Several source keys may share a target; the
/// first one present in the source wins.
const DIRECT_MAPPINGS: &[(&str, &str)] = &[
    (keys::GEN_AI_SYSTEM, keys::LLM_SYSTEM),
    (keys::GEN_AI_PROVIDER_NAME, keys::LLM_PROVIDER),
    (keys::GEN_AI_REQUEST_MODEL, keys::LLM_MODEL_NAME),
    (keys::GEN_AI_RESPONSE_MODEL, keys::LLM_MODEL_NAME),
    (keys::LLM_REQUEST_MODEL, keys::LLM_MODEL_NAME),
    (keys::LLM_RESPONSE_MODEL, keys::LLM_MODEL_NAME),
    (keys::GEN_AI_USAGE_PROMPT_TOKENS, keys::LLM_TOKEN_COUNT_PROMPT),
    (keys::GEN_AI_USAGE_INPUT_TOKENS, keys::LLM_TOKEN_COUNT_PROMPT),
    (keys::GEN_AI_USAGE_COMPLETION_TOKENS, keys::LLM_TOKEN_COUNT_COMPLETION),
    (keys::GEN_AI_USAGE_OUTPUT_TOKENS, keys::LLM_TOKEN_COUNT_COMPLETION),
    (keys::GEN_AI_USAGE_TOTAL_TOKENS, keys::LLM_TOKEN_COUNT_TOTAL),
    (keys::LLM_USAGE_TOTAL_TOKENS, keys::LLM_TOKEN_COUNT_TOTAL),
    (keys::GEN_AI_USAGE_CACHE_READ, keys::LLM_TOKEN_COUNT_CACHE_READ),
    (keys::GEN_AI_USAGE_CACHE_CREATION, keys::LLM_TOKEN_COUNT_CACHE_WRITE),
    (keys::GEN_AI_USAGE_REASONING, keys::LLM_TOKEN_COUNT_REASONING),
    (keys::TRACELOOP_ENTITY_INPUT, keys::INPUT_VALUE),
    (keys::TRACELOOP_ENTITY_OUTPUT, keys::OUTPUT_VALUE),
    (keys::TRACELOOP_SESSION_ID, keys::SESSION_ID),
    (keys::TRACELOOP_USER_ID, keys::USER_ID),
];

/// OpenInference span kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SpanKind {
    Chain,
    Tool,
    Agent,
    Llm,
    Unknown,
}

impl SpanKind {
    /// Map a Traceloop span kind, ignoring case. Unrecognized kinds are
    /// `Unknown`.
    pub(super) fn from_traceloop(kind: &str) -> Self {
        match kind.to_ascii_lowercase().as_str() {
            "workflow" => Self::Chain,
            "task" | "tool" => Self::Tool,
            "agent" => Self::Agent,
            _ => Self::Unknown,
        }
    }

    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::Chain => "CHAIN",
            Self::Tool => "TOOL",
            Self::Agent => "AGENT",
            Self::Llm => "LLM",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Target key and value for a directly mapped source key.
pub(super) fn direct(key: &str, value: &JsonValue) -> Option<(&'static str, AttributeValue)> {
    if key == keys::TRACELOOP_SPAN_KIND {
        let kind = SpanKind::from_traceloop(value.as_str().unwrap_or_default());
        return Some((keys::OPENINFERENCE_SPAN_KIND, AttributeValue::from(kind.as_str())));
    }

    DIRECT_MAPPINGS
        .iter()
        .find(|(source, _)| *source == key)
        .map(|(_, target)| (*target, AttributeValue::from_json(value)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_span_kind_table() {
        assert_eq!(SpanKind::from_traceloop("workflow"), SpanKind::Chain);
        assert_eq!(SpanKind::from_traceloop("task"), SpanKind::Tool);
        assert_eq!(SpanKind::from_traceloop("agent"), SpanKind::Agent);
        assert_eq!(SpanKind::from_traceloop("tool"), SpanKind::Tool);
        assert_eq!(SpanKind::from_traceloop("unknown"), SpanKind::Unknown);
    }

    #[test]
    fn test_span_kind_case_insensitive_and_default() {
        assert_eq!(SpanKind::from_traceloop("AGENT"), SpanKind::Agent);
        assert_eq!(SpanKind::from_traceloop("Workflow"), SpanKind::Chain);
        assert_eq!(SpanKind::from_traceloop("retriever"), SpanKind::Unknown);
        assert_eq!(SpanKind::from_traceloop(""), SpanKind::Unknown);
    }

    #[test]
    fn test_direct_span_kind() {
        let (target, value) = direct("traceloop.span.kind", &json!("agent")).unwrap();
        assert_eq!(target, "openinference.span.kind");
        assert_eq!(value, AttributeValue::from("AGENT"));
    }

    #[test]
    fn test_direct_non_string_span_kind_is_unknown() {
        let (_, value) = direct("traceloop.span.kind", &json!(3)).unwrap();
        assert_eq!(value, AttributeValue::from("UNKNOWN"));
    }

    #[test]
    fn test_direct_model_variants_collapse() {
        for key in [
            "gen_ai.request.model",
            "gen_ai.response.model",
            "llm.request.model",
            "llm.response.model",
        ] {
            let (target, _) = direct(key, &json!("gpt-4")).unwrap();
            assert_eq!(target, "llm.model_name", "{key}");
        }
    }

    #[test]
    fn test_direct_token_counts_keep_integers() {
        let (target, value) = direct("gen_ai.usage.input_tokens", &json!(12)).unwrap();
        assert_eq!(target, "llm.token_count.prompt");
        assert_eq!(value, AttributeValue::Int(12));
    }

    #[test]
    fn test_direct_unmapped_key() {
        assert!(direct("gen_ai.response.id", &json!("x")).is_none());
    }
}
