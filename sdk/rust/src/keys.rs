//! Attribute keys for both conventions.

// ============================================================================
// OPENLLMETRY (SOURCE)
// ============================================================================

// Messages
pub const GEN_AI_PROMPT: &str = "gen_ai.prompt";
pub const GEN_AI_COMPLETION: &str = "gen_ai.completion";

// Model
pub const GEN_AI_SYSTEM: &str = "gen_ai.system";
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";
pub const GEN_AI_REQUEST_MODEL: &str = "gen_ai.request.model";
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";
pub const GEN_AI_RESPONSE_ID: &str = "gen_ai.response.id";
pub const LLM_REQUEST_MODEL: &str = "llm.request.model";
pub const LLM_RESPONSE_MODEL: &str = "llm.response.model";

// Usage
pub const GEN_AI_USAGE_PROMPT_TOKENS: &str = "gen_ai.usage.prompt_tokens";
pub const GEN_AI_USAGE_INPUT_TOKENS: &str = "gen_ai.usage.input_tokens";
pub const GEN_AI_USAGE_COMPLETION_TOKENS: &str = "gen_ai.usage.completion_tokens";
pub const GEN_AI_USAGE_OUTPUT_TOKENS: &str = "gen_ai.usage.output_tokens";
pub const GEN_AI_USAGE_TOTAL_TOKENS: &str = "gen_ai.usage.total_tokens";
pub const LLM_USAGE_TOTAL_TOKENS: &str = "llm.usage.total_tokens";
pub const GEN_AI_USAGE_CACHE_READ: &str = "gen_ai.usage.cache_read_input_tokens";
pub const GEN_AI_USAGE_CACHE_CREATION: &str = "gen_ai.usage.cache_creation_input_tokens";
pub const GEN_AI_USAGE_REASONING: &str = "gen_ai.usage.reasoning_tokens";

// Request parameters
pub const GEN_AI_REQUEST_PREFIX: &str = "gen_ai.request.";
pub const LLM_REQUEST_PREFIX: &str = "llm.request.";
pub const LLM_FREQUENCY_PENALTY: &str = "llm.frequency_penalty";
pub const LLM_PRESENCE_PENALTY: &str = "llm.presence_penalty";
pub const LLM_TOP_K: &str = "llm.top_k";
pub const LLM_CHAT_STOP_SEQUENCES: &str = "llm.chat.stop_sequences";
pub const LLM_IS_STREAMING: &str = "llm.is_streaming";
pub const LLM_USER: &str = "llm.user";

// Tools
pub const LLM_REQUEST_FUNCTIONS: &str = "llm.request.functions";
pub const LLM_REQUEST_TOOLS: &str = "llm.request.tools";

// Traceloop
pub const TRACELOOP_SPAN_KIND: &str = "traceloop.span.kind";
pub const TRACELOOP_ENTITY_INPUT: &str = "traceloop.entity.input";
pub const TRACELOOP_ENTITY_OUTPUT: &str = "traceloop.entity.output";
pub const TRACELOOP_SESSION_ID: &str = "traceloop.association.properties.session_id";
pub const TRACELOOP_USER_ID: &str = "traceloop.association.properties.user_id";

// ============================================================================
// OPENINFERENCE (OUTPUT)
// ============================================================================

pub const SESSION_ID: &str = "session.id";
pub const USER_ID: &str = "user.id";
pub const TAG_TAGS: &str = "tag.tags";
pub const METADATA: &str = "metadata";
pub const OPENINFERENCE_SPAN_KIND: &str = "openinference.span.kind";

pub const LLM_SYSTEM: &str = "llm.system";
pub const LLM_PROVIDER: &str = "llm.provider";
pub const LLM_MODEL_NAME: &str = "llm.model_name";
pub const LLM_INVOCATION_PARAMETERS: &str = "llm.invocation_parameters";

pub const LLM_TOKEN_COUNT_PROMPT: &str = "llm.token_count.prompt";
pub const LLM_TOKEN_COUNT_COMPLETION: &str = "llm.token_count.completion";
pub const LLM_TOKEN_COUNT_TOTAL: &str = "llm.token_count.total";
pub const LLM_TOKEN_COUNT_CACHE_READ: &str = "llm.token_count.prompt_details.cache_read";
pub const LLM_TOKEN_COUNT_CACHE_WRITE: &str = "llm.token_count.prompt_details.cache_write";
pub const LLM_TOKEN_COUNT_REASONING: &str = "llm.token_count.completion_details.reasoning";

pub const LLM_INPUT_MESSAGES: &str = "llm.input_messages";
pub const LLM_OUTPUT_MESSAGES: &str = "llm.output_messages";
pub const LLM_TOOLS: &str = "llm.tools";

pub const LLM_PROMPT_TEMPLATE: &str = "llm.prompt_template.template";
pub const LLM_PROMPT_TEMPLATE_VARIABLES: &str = "llm.prompt_template.variables";
pub const LLM_PROMPT_TEMPLATE_VERSION: &str = "llm.prompt_template.version";

pub const INPUT_VALUE: &str = "input.value";
pub const INPUT_MIME_TYPE: &str = "input.mime_type";
pub const OUTPUT_VALUE: &str = "output.value";
pub const OUTPUT_MIME_TYPE: &str = "output.mime_type";

pub const MIME_JSON: &str = "application/json";

// ============================================================================
// KEY GROUPS
// ============================================================================

/// Keys copied through untouched before any other stage runs.
pub const CONTEXT_KEYS: &[&str] = &[
    SESSION_ID,
    USER_ID,
    OPENINFERENCE_SPAN_KIND,
    METADATA,
    TAG_TAGS,
    LLM_PROMPT_TEMPLATE,
    LLM_PROMPT_TEMPLATE_VARIABLES,
    LLM_PROMPT_TEMPLATE_VERSION,
];

/// Keys whose nested values survive the flattening pre-pass.
pub const PRESERVE_KEYS: &[&str] = &[GEN_AI_PROMPT, GEN_AI_COMPLETION];

/// Keys holding a whole tool/function schema list.
pub const TOOL_LIST_KEYS: &[&str] = &[LLM_REQUEST_FUNCTIONS, LLM_REQUEST_TOOLS];

/// Request parameter keys outside the `*.request.*` prefixes.
pub const INVOCATION_PARAMETER_KEYS: &[&str] = &[
    LLM_FREQUENCY_PENALTY,
    LLM_PRESENCE_PENALTY,
    LLM_TOP_K,
    LLM_CHAT_STOP_SEQUENCES,
    LLM_IS_STREAMING,
    LLM_USER,
];

/// Source keys naming the requested model.
pub const REQUEST_MODEL_KEYS: &[&str] = &[GEN_AI_REQUEST_MODEL, LLM_REQUEST_MODEL];

/// Namespaces that must keep dotted indices.
pub const BRACKET_RESERVED_PREFIXES: &[&str] = &[
    "gen_ai.",
    LLM_INPUT_MESSAGES,
    LLM_OUTPUT_MESSAGES,
    LLM_TOOLS,
    LLM_REQUEST_FUNCTIONS,
    LLM_REQUEST_TOOLS,
];

pub fn is_context_key(key: &str) -> bool {
    CONTEXT_KEYS.contains(&key)
}

pub fn is_preserve_key(key: &str) -> bool {
    PRESERVE_KEYS.contains(&key)
}
