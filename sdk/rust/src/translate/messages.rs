//! Prompt and completion message reconstruction.
//!
//! OpenLLMetry records messages in one of three equivalent encodings:
//!
//! - a list: `gen_ai.prompt = [{"role": "user", "content": "hi"}]`
//! - an indexed map: `gen_ai.prompt = {"0": {"role": "user", "content": "hi"}}`
//! - dotted fragments: `gen_ai.prompt.0.role = "user"`, `gen_ai.prompt.0.content = "hi"`
//!
//! All of them become OpenInference messages, emitted twice: once as a JSON
//! summary (`llm.input_messages`) and once exploded per field
//! (`llm.input_messages.0.message.content`).
//!
//! Tool calls inside a message get the same treatment. The flat
//! (`{id, name, arguments}`), nested (`{id, function: {name, arguments}}`) and
//! canonical (`{"tool_call.id", "tool_call.function.name", ..}`) encodings
//! collapse to the canonical one.

use serde_json::{Map, Value as JsonValue};

use crate::config::TranslatorConfig;
use crate::keys;
use crate::value::{AttributeValue, OutputAttributes};

use super::metadata::MetadataBucket;
use super::{Collected, Shadowed, StageOutcome, collect_entries, split_index};

const MESSAGE_PREFIX: &str = "message.";
const TOOL_CALLS: &str = "tool_calls";
const MESSAGE_TOOL_CALLS: &str = "message.tool_calls";

const TOOL_CALL_ID: &str = "tool_call.id";
const TOOL_CALL_NAME: &str = "tool_call.function.name";
const TOOL_CALL_ARGUMENTS: &str = "tool_call.function.arguments";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Direction {
    Input,
    Output,
}

impl Direction {
    fn source_key(self) -> &'static str {
        match self {
            Self::Input => keys::GEN_AI_PROMPT,
            Self::Output => keys::GEN_AI_COMPLETION,
        }
    }

    fn output_key(self) -> &'static str {
        match self {
            Self::Input => keys::LLM_INPUT_MESSAGES,
            Self::Output => keys::LLM_OUTPUT_MESSAGES,
        }
    }
}

// ============================================================================
// TOOL CALLS
// ============================================================================

/// Collect tool call fields, descending only into the `tool_call` and
/// `function` wrappers so argument objects stay intact.
fn collect_call_fields<'a>(
    prefix: &str,
    fields: &'a Map<String, JsonValue>,
    out: &mut Vec<(String, &'a JsonValue)>,
) {
    for (key, value) in fields {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            JsonValue::Object(inner) if key == "tool_call" || key == "function" => {
                collect_call_fields(&path, inner, out);
            }
            _ => out.push((path, value)),
        }
    }
}

fn arguments_text(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::String(_) => value.clone(),
        other => JsonValue::String(other.to_string()),
    }
}

/// Canonicalize one tool call.
///
/// Field order is id, function name, arguments, then any other field as
/// `tool_call.<field>`. When two encodings of the same field are present
/// (`name` and `function.name`, say) the first one wins and the others are
/// returned as shadowed, keyed by their path inside the call.
pub(super) fn canonical_tool_call(
    fields: &Map<String, JsonValue>,
) -> (Map<String, JsonValue>, Shadowed) {
    let mut collected = Vec::new();
    collect_call_fields("", fields, &mut collected);

    let mut id = None;
    let mut name = None;
    let mut arguments = None;
    let mut passthrough = Vec::new();
    let mut shadowed = Shadowed::new();
    for (path, value) in collected {
        let field = path.strip_prefix("tool_call.").unwrap_or(&path);
        let slot = match field {
            "id" => &mut id,
            "name" | "function.name" => &mut name,
            "arguments" | "function.arguments" => &mut arguments,
            other => {
                passthrough.push((format!("tool_call.{other}"), path.clone(), value));
                continue;
            }
        };
        if slot.is_some() {
            shadowed.push((path.clone(), value.clone()));
        } else {
            *slot = Some(value);
        }
    }

    let mut call = Map::new();
    if let Some(id) = id {
        call.insert(TOOL_CALL_ID.to_string(), id.clone());
    }
    if let Some(name) = name {
        call.insert(TOOL_CALL_NAME.to_string(), name.clone());
    }
    if let Some(arguments) = arguments {
        call.insert(TOOL_CALL_ARGUMENTS.to_string(), arguments_text(arguments));
    }
    for (key, path, value) in passthrough {
        if call.contains_key(&key) {
            shadowed.push((path, value.clone()));
        } else {
            call.insert(key, value.clone());
        }
    }
    (call, shadowed)
}

/// Canonicalize a tool call container in any encoding.
///
/// Shadowed values are keyed by their path inside the container.
fn canonical_tool_calls(value: &JsonValue) -> Option<(JsonValue, Shadowed)> {
    let Collected {
        entries,
        mut shadowed,
    } = collect_entries(value, None)?;

    let mut calls = Vec::new();
    for (j, fields) in &entries {
        let (call, call_shadowed) = canonical_tool_call(fields);
        shadowed.extend(
            call_shadowed
                .into_iter()
                .map(|(path, value)| (format!("{j}.{path}"), value)),
        );
        if !call.is_empty() {
            calls.push(JsonValue::Object(call));
        }
    }
    (!calls.is_empty()).then_some((JsonValue::Array(calls), shadowed))
}

fn prefixed(prefix: &str, shadowed: Shadowed) -> impl Iterator<Item = (String, JsonValue)> + '_ {
    shadowed
        .into_iter()
        .map(move |(path, value)| (format!("{prefix}.{path}"), value))
}

// ============================================================================
// MESSAGES
// ============================================================================

/// Canonicalize one message's fields.
///
/// Bare fields gain the `message.` prefix, fields already carrying it are
/// kept. A whole `tool_calls` value wins over `tool_calls.<i>.*` fragments.
/// Everything that loses a collision is returned as shadowed, keyed by its
/// path inside the message.
fn canonical_message(fields: &Map<String, JsonValue>) -> (Map<String, JsonValue>, Shadowed) {
    let mut message = Map::new();
    let mut call_fragments = Map::new();
    let mut shadowed = Shadowed::new();

    for (field, value) in fields {
        let bare = field.strip_prefix(MESSAGE_PREFIX).unwrap_or(field);
        if bare == TOOL_CALLS {
            if message.contains_key(MESSAGE_TOOL_CALLS) {
                shadowed.push((field.clone(), value.clone()));
                continue;
            }
            let calls = match canonical_tool_calls(value) {
                Some((calls, calls_shadowed)) => {
                    shadowed.extend(prefixed(field, calls_shadowed));
                    calls
                }
                None => value.clone(),
            };
            message.insert(MESSAGE_TOOL_CALLS.to_string(), calls);
        } else if let Some(rest) = bare.strip_prefix("tool_calls.")
            && split_index(rest).is_some()
        {
            if call_fragments.contains_key(rest) {
                shadowed.push((field.clone(), value.clone()));
            } else {
                call_fragments.insert(rest.to_string(), value.clone());
            }
        } else {
            let key = format!("{MESSAGE_PREFIX}{bare}");
            if message.contains_key(&key) {
                shadowed.push((field.clone(), value.clone()));
            } else {
                message.insert(key, value.clone());
            }
        }
    }

    if call_fragments.is_empty() {
        return (message, shadowed);
    }
    if message.contains_key(MESSAGE_TOOL_CALLS) {
        shadowed.extend(prefixed(TOOL_CALLS, call_fragments.into_iter().collect()));
    } else if let Some((calls, calls_shadowed)) =
        canonical_tool_calls(&JsonValue::Object(call_fragments))
    {
        shadowed.extend(prefixed(TOOL_CALLS, calls_shadowed));
        message.insert(MESSAGE_TOOL_CALLS.to_string(), calls);
    }
    (message, shadowed)
}

/// Write the JSON summary and the exploded per-field keys.
///
/// Output indices are positions in the reconstructed list, not the source
/// indices: a lone `gen_ai.prompt.2.content` becomes
/// `llm.input_messages.0.message.content`. Tool call indices are renumbered
/// the same way.
fn emit_messages(
    direction: Direction,
    messages: &[Map<String, JsonValue>],
    out: &mut OutputAttributes,
) {
    let base = direction.output_key();
    let summary: Vec<JsonValue> = messages
        .iter()
        .cloned()
        .map(JsonValue::Object)
        .collect();
    out.insert_if_absent(base, AttributeValue::String(JsonValue::Array(summary).to_string()));

    for (i, message) in messages.iter().enumerate() {
        for (field, value) in message {
            match value {
                JsonValue::Array(calls) if field == MESSAGE_TOOL_CALLS => {
                    for (j, call) in calls.iter().enumerate() {
                        let JsonValue::Object(call) = call else {
                            continue;
                        };
                        for (call_field, call_value) in call {
                            out.insert_if_absent(
                                format!("{base}.{i}.{field}.{j}.{call_field}"),
                                AttributeValue::from_json(call_value),
                            );
                        }
                    }
                }
                _ => {
                    out.insert_if_absent(
                        format!("{base}.{i}.{field}"),
                        AttributeValue::from_json(value),
                    );
                }
            }
        }
    }
}

// ============================================================================
// RECONSTRUCTOR
// ============================================================================

/// Collects one direction's messages during the pass.
#[derive(Debug)]
pub(super) struct MessageReconstructor {
    direction: Direction,
    whole: Option<Collected>,
    fragments: Map<String, JsonValue>,
}

impl MessageReconstructor {
    pub(super) fn new(direction: Direction) -> Self {
        Self {
            direction,
            whole: None,
            fragments: Map::new(),
        }
    }

    /// Claim the whole prompt/completion key or one of its indexed fragments.
    ///
    /// A whole value that is not a usable container is left for later stages.
    pub(super) fn offer(&mut self, key: &str, value: &JsonValue) -> StageOutcome {
        let source_key = self.direction.source_key();

        if key == source_key {
            if self.whole.is_some() {
                return StageOutcome::Skipped;
            }
            return match collect_entries(value, Some("content")) {
                Some(collected) if !collected.entries.is_empty() => {
                    self.whole = Some(collected);
                    StageOutcome::Claimed
                }
                _ => StageOutcome::Skipped,
            };
        }

        match key
            .strip_prefix(source_key)
            .and_then(|rest| rest.strip_prefix('.'))
        {
            Some(rest) if split_index(rest).is_some() => {
                self.fragments
                    .entry(rest)
                    .or_insert_with(|| value.clone());
                StageOutcome::Claimed
            }
            _ => StageOutcome::Skipped,
        }
    }

    /// Emit the reconstructed messages. Fragments only count when no whole
    /// value was present; otherwise they go to the metadata bucket.
    pub(super) fn finish(
        self,
        out: &mut OutputAttributes,
        metadata: &mut MetadataBucket,
        config: &TranslatorConfig,
    ) {
        let source_key = self.direction.source_key();
        let collected = match self.whole {
            Some(collected) => {
                for (rest, value) in &self.fragments {
                    metadata.insert(&format!("{source_key}.{rest}"), value);
                }
                collected
            }
            None if self.fragments.is_empty() => return,
            None => {
                step!(
                    config,
                    source = source_key,
                    fragments = self.fragments.len(),
                    "rebuilding messages from fragments"
                );
                let fragments = JsonValue::Object(self.fragments);
                match collect_entries(&fragments, Some("content")) {
                    Some(collected) => collected,
                    None => {
                        metadata.insert(source_key, &fragments);
                        return;
                    }
                }
            }
        };

        let mut shadowed = collected.shadowed;
        let mut messages = Vec::with_capacity(collected.entries.len());
        for (idx, fields) in &collected.entries {
            let (message, message_shadowed) = canonical_message(fields);
            shadowed.extend(
                message_shadowed
                    .into_iter()
                    .map(|(path, value)| (format!("{idx}.{path}"), value)),
            );
            messages.push(message);
        }
        if !shadowed.is_empty() {
            step!(
                config,
                source = source_key,
                shadowed = shadowed.len(),
                "colliding message fields kept in metadata"
            );
        }
        for (path, value) in prefixed(source_key, shadowed) {
            metadata.insert(&path, &value);
        }

        step!(
            config,
            target = self.direction.output_key(),
            messages = messages.len(),
            "messages reconstructed"
        );
        emit_messages(self.direction, &messages, out);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap()
    }

    fn reconstruct_with_metadata(
        direction: Direction,
        pairs: &[(&str, JsonValue)],
    ) -> (OutputAttributes, MetadataBucket) {
        let config = TranslatorConfig::default();
        let mut reconstructor = MessageReconstructor::new(direction);
        for (key, value) in pairs {
            reconstructor.offer(key, value);
        }
        let mut out = OutputAttributes::new();
        let mut metadata = MetadataBucket::default();
        reconstructor.finish(&mut out, &mut metadata, &config);
        (out, metadata)
    }

    fn reconstruct(direction: Direction, pairs: &[(&str, JsonValue)]) -> OutputAttributes {
        reconstruct_with_metadata(direction, pairs).0
    }

    #[test]
    fn test_tool_call_shapes_are_equivalent() {
        let expected = object(json!({
            "tool_call.id": "1",
            "tool_call.function.name": "f",
            "tool_call.function.arguments": "{}"
        }));
        let flat = object(json!({"id": "1", "name": "f", "arguments": "{}"}));
        let nested = object(json!({"id": "1", "function": {"name": "f", "arguments": "{}"}}));
        let dotted = object(json!({
            "tool_call.id": "1",
            "tool_call.function.name": "f",
            "tool_call.function.arguments": "{}"
        }));

        assert_eq!(canonical_tool_call(&flat), (expected.clone(), vec![]));
        assert_eq!(canonical_tool_call(&nested), (expected.clone(), vec![]));
        assert_eq!(canonical_tool_call(&dotted), (expected, vec![]));
    }

    #[test]
    fn test_tool_call_duplicate_name_is_shadowed() {
        let (call, shadowed) = canonical_tool_call(&object(json!({
            "id": "1",
            "name": "flat",
            "function": {"name": "nested"}
        })));
        assert_eq!(call["tool_call.function.name"], json!("flat"));
        assert_eq!(shadowed, vec![("function.name".to_string(), json!("nested"))]);
    }

    #[test]
    fn test_tool_call_wrapper_and_object_arguments() {
        let wrapped = object(json!({
            "tool_call": {"id": "c1", "function": {"name": "f", "arguments": {"city": "Paris"}}},
            "type": "function"
        }));
        let (call, shadowed) = canonical_tool_call(&wrapped);
        assert!(shadowed.is_empty());
        assert_eq!(call["tool_call.id"], json!("c1"));
        assert_eq!(call["tool_call.function.name"], json!("f"));
        assert_eq!(call["tool_call.function.arguments"], json!(r#"{"city":"Paris"}"#));
        assert_eq!(call["tool_call.type"], json!("function"));
    }

    #[test]
    fn test_tool_calls_indexed_dict() {
        let (calls, shadowed) = canonical_tool_calls(&json!({
            "1": {"id": "b", "name": "second"},
            "0": {"id": "a", "name": "first"}
        }))
        .unwrap();
        assert!(shadowed.is_empty());
        assert_eq!(calls[0]["tool_call.id"], json!("a"));
        assert_eq!(calls[1]["tool_call.function.name"], json!("second"));
    }

    #[test]
    fn test_canonical_message_prefixes_fields() {
        let (message, _) = canonical_message(&object(json!({
            "role": "assistant",
            "content": "ok",
            "finish_reason": "stop",
            "message.name": "bot"
        })));
        assert_eq!(message["message.role"], json!("assistant"));
        assert_eq!(message["message.content"], json!("ok"));
        assert_eq!(message["message.finish_reason"], json!("stop"));
        assert_eq!(message["message.name"], json!("bot"));
        assert!(!message.contains_key("message.message.name"));
    }

    #[test]
    fn test_canonical_message_tool_call_fragments() {
        let (message, _) = canonical_message(&object(json!({
            "role": "assistant",
            "tool_calls.0.id": "c1",
            "tool_calls.0.name": "lookup",
            "tool_calls.0.arguments": "{\"q\":1}"
        })));
        assert_eq!(
            message["message.tool_calls"],
            json!([{
                "tool_call.id": "c1",
                "tool_call.function.name": "lookup",
                "tool_call.function.arguments": "{\"q\":1}"
            }])
        );
    }

    #[test]
    fn test_canonical_message_role_collision_is_shadowed() {
        let (message, shadowed) = canonical_message(&object(json!({
            "role": "assistant",
            "message.role": "tool"
        })));
        assert_eq!(message["message.role"], json!("assistant"));
        assert_eq!(shadowed, vec![("message.role".to_string(), json!("tool"))]);
    }

    #[test]
    fn test_tool_call_fragments_beside_whole_list_go_to_metadata() {
        let (out, metadata) = reconstruct_with_metadata(
            Direction::Output,
            &[
                ("gen_ai.completion.0.role", json!("assistant")),
                (
                    "gen_ai.completion.0.tool_calls",
                    json!([{"id": "whole", "name": "f"}]),
                ),
                (
                    "gen_ai.completion.0.tool_calls.0.arguments",
                    json!(r#"{"city":"Paris"}"#),
                ),
            ],
        );
        assert_eq!(
            out.get_str("llm.output_messages.0.message.tool_calls.0.tool_call.id"),
            Some("whole")
        );
        assert!(!out.contains_key(
            "llm.output_messages.0.message.tool_calls.0.tool_call.function.arguments"
        ));
        assert_eq!(
            metadata.get("gen_ai.completion.0.tool_calls.0.arguments"),
            Some(&json!(r#"{"city":"Paris"}"#))
        );
    }

    #[test]
    fn test_whole_prompt_collisions_go_to_metadata() {
        let (out, metadata) = reconstruct_with_metadata(
            Direction::Input,
            &[(
                "gen_ai.prompt",
                json!({"0": {"role": "user", "content": "a"}, "0.content": "b"}),
            )],
        );
        assert_eq!(out.get_str("llm.input_messages.0.message.content"), Some("a"));
        assert_eq!(metadata.get("gen_ai.prompt.0.content"), Some(&json!("b")));
    }

    #[test]
    fn test_indexed_dict_prompt() {
        let out = reconstruct(
            Direction::Input,
            &[("gen_ai.prompt", json!({"0": {"role": "user", "content": "hi"}}))],
        );
        assert_eq!(
            out.get_str("llm.input_messages"),
            Some(r#"[{"message.role":"user","message.content":"hi"}]"#)
        );
        assert_eq!(out.get_str("llm.input_messages.0.message.role"), Some("user"));
        assert_eq!(out.get_str("llm.input_messages.0.message.content"), Some("hi"));
    }

    #[test]
    fn test_fragment_completion_with_tool_calls() {
        let out = reconstruct(
            Direction::Output,
            &[
                ("gen_ai.completion.0.role", json!("assistant")),
                ("gen_ai.completion.0.finish_reason", json!("tool_calls")),
                ("gen_ai.completion.0.tool_calls.0.id", json!("call_1")),
                ("gen_ai.completion.0.tool_calls.0.name", json!("get_weather")),
                ("gen_ai.completion.0.tool_calls.0.arguments", json!("{}")),
            ],
        );
        assert_eq!(
            out.get_str("llm.output_messages.0.message.tool_calls.0.tool_call.id"),
            Some("call_1")
        );
        assert_eq!(
            out.get_str("llm.output_messages.0.message.tool_calls.0.tool_call.function.name"),
            Some("get_weather")
        );
        assert_eq!(
            out.get_str("llm.output_messages.0.message.finish_reason"),
            Some("tool_calls")
        );
        assert!(!out.contains_key("llm.output_messages.0.message.tool_calls"));
    }

    #[test]
    fn test_list_prompt_non_scalar_content_is_json() {
        let out = reconstruct(
            Direction::Input,
            &[(
                "gen_ai.prompt",
                json!([{"role": "user", "content": [{"type": "text", "text": "hi"}]}]),
            )],
        );
        assert_eq!(
            out.get_str("llm.input_messages.0.message.content"),
            Some(r#"[{"type":"text","text":"hi"}]"#)
        );
    }

    #[test]
    fn test_scalar_prompt_is_not_claimed() {
        let mut reconstructor = MessageReconstructor::new(Direction::Input);
        assert_eq!(
            reconstructor.offer("gen_ai.prompt", &json!("plain text")),
            StageOutcome::Skipped
        );
        assert_eq!(
            reconstructor.offer("gen_ai.prompt.name", &json!("x")),
            StageOutcome::Skipped
        );
    }

    #[test]
    fn test_role_is_not_defaulted() {
        let out = reconstruct(Direction::Input, &[("gen_ai.prompt.0.content", json!("hi"))]);
        assert!(!out.contains_key("llm.input_messages.0.message.role"));
        assert_eq!(
            out.get_str("llm.input_messages"),
            Some(r#"[{"message.content":"hi"}]"#)
        );
    }
}
