//! OpenLLMetry → OpenInference attribute translation.
//!
//! Every source key is offered to the stages in a fixed order and the first
//! stage that accepts it claims it:
//!
//! 1. Context keys (copied through before anything else)
//! 2. Bracket notation for indexed keys outside reserved namespaces
//! 3. Direct key remapping (including the span-kind enum)
//! 4. Invocation parameters
//! 5. Tool lists and tool fragments
//! 6. Prompt and completion messages
//! 7. Metadata bucket (everything left)
//!
//! Structural reconstruction, aggregated attributes and post-processing run
//! once after the pass. All output writes are insert-if-absent.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::config::TranslatorConfig;
use crate::keys;
use crate::value::{AttributeValue, OutputAttributes, SourceAttributes};

/// Emit a debug event when the translator runs with `debug` enabled.
macro_rules! step {
    ($config:expr, $($arg:tt)+) => {
        if $config.debug {
            tracing::debug!($($arg)+);
        }
    };
}

mod flatten;
mod mapping;
mod messages;
mod metadata;
mod params;
mod postprocess;
mod tools;

use self::messages::{Direction, MessageReconstructor};
use self::metadata::MetadataBucket;
use self::params::InvocationParameters;
use self::postprocess::Resolved;
use self::tools::ToolReconstructor;

// ============================================================================
// PUBLIC ENTRY POINT
// ============================================================================

/// Translate an OpenLLMetry attribute set into OpenInference attributes.
///
/// Pure and total: the same input and config always give the same output,
/// and malformed parts of the input degrade locally instead of failing.
pub fn translate(source: &SourceAttributes, config: &TranslatorConfig) -> OutputAttributes {
    Translator::new(config).run(source)
}

// ============================================================================
// STAGE OUTCOMES
// ============================================================================

/// Result of offering a key to a structural stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageOutcome {
    Claimed,
    Skipped,
}

/// Stage that claimed a source key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Bracket,
    Direct,
    InvocationParameters,
    Tools,
    Messages,
    Metadata,
}

// ============================================================================
// SHAPE DETECTION
// ============================================================================

/// Entries of an indexed container, ordered by index.
type Entries = BTreeMap<usize, Map<String, JsonValue>>;

/// The encodings an indexed container can arrive in.
enum Shape<'a> {
    /// `[a, b]`
    List(&'a [JsonValue]),
    /// `{"0": a, "1": b}` or `{"0.role": .., "1.content": ..}`
    Indexed(&'a Map<String, JsonValue>),
    /// A single entry with no index keys.
    Single(&'a Map<String, JsonValue>),
}

fn detect_shape(value: &JsonValue) -> Option<Shape<'_>> {
    match value {
        JsonValue::Array(items) => Some(Shape::List(items)),
        JsonValue::Object(map)
            if !map.is_empty() && map.keys().all(|k| split_index(k).is_some()) =>
        {
            Some(Shape::Indexed(map))
        }
        JsonValue::Object(map) => Some(Shape::Single(map)),
        _ => None,
    }
}

/// Parse a string holding a JSON array or object; anything else is returned
/// unchanged.
fn parse_container(value: &JsonValue) -> Cow<'_, JsonValue> {
    if let JsonValue::String(s) = value {
        let trimmed = s.trim_start();
        if (trimmed.starts_with('[') || trimmed.starts_with('{'))
            && let Ok(parsed @ (JsonValue::Array(_) | JsonValue::Object(_))) =
                serde_json::from_str::<JsonValue>(s)
        {
            return Cow::Owned(parsed);
        }
    }
    Cow::Borrowed(value)
}

/// Parse an all-digit path segment.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

/// Split `"3"` into `(3, None)` and `"3.role"` into `(3, Some("role"))`.
fn split_index(key: &str) -> Option<(usize, Option<&str>)> {
    match key.split_once('.') {
        Some((head, rest)) => parse_index(head).map(|idx| (idx, Some(rest))),
        None => parse_index(key).map(|idx| (idx, None)),
    }
}

/// Values that lost a first-writer-wins collision, keyed by their path
/// relative to the container they came from.
type Shadowed = Vec<(String, JsonValue)>;

/// A normalized container.
#[derive(Debug, Default, PartialEq)]
struct Collected {
    entries: Entries,
    /// Values that could not be placed in an entry.
    shadowed: Shadowed,
}

/// Normalize any container encoding into indexed field maps.
///
/// Non-object items are stored under `scalar_field` when one is given. A
/// value that cannot be placed (a field already taken, or a scalar with no
/// `scalar_field`) is reported in `shadowed` instead of being dropped.
fn collect_entries(value: &JsonValue, scalar_field: Option<&str>) -> Option<Collected> {
    let value = parse_container(value);
    let shape = detect_shape(&value)?;

    let mut collected = Collected::default();
    match shape {
        Shape::List(items) => {
            for (idx, item) in items.iter().enumerate() {
                merge_entry(&mut collected, idx, &idx.to_string(), item, scalar_field);
            }
        }
        Shape::Indexed(map) => {
            for (key, item) in map {
                let Some((idx, rest)) = split_index(key) else {
                    continue;
                };
                match rest {
                    Some(field) => place_field(&mut collected, idx, field, key, item),
                    None => merge_entry(&mut collected, idx, key, item, scalar_field),
                }
            }
        }
        Shape::Single(map) => {
            collected.entries.insert(0, map.clone());
        }
    }

    collected.entries.retain(|_, entry| !entry.is_empty());
    Some(collected)
}

fn merge_entry(
    collected: &mut Collected,
    idx: usize,
    path: &str,
    item: &JsonValue,
    scalar_field: Option<&str>,
) {
    match parse_container(item).as_ref() {
        JsonValue::Object(fields) => {
            for (field, value) in fields {
                place_field(collected, idx, field, &format!("{path}.{field}"), value);
            }
        }
        _ => match scalar_field {
            Some(field) => place_field(collected, idx, field, path, item),
            None => collected.shadowed.push((path.to_string(), item.clone())),
        },
    }
}

fn place_field(collected: &mut Collected, idx: usize, field: &str, path: &str, value: &JsonValue) {
    let entry = collected.entries.entry(idx).or_default();
    if entry.contains_key(field) {
        collected.shadowed.push((path.to_string(), value.clone()));
    } else {
        entry.insert(field.to_string(), value.clone());
    }
}

// ============================================================================
// TRANSLATOR
// ============================================================================

/// Working state of one translation.
struct Translator<'a> {
    config: &'a TranslatorConfig,
    out: OutputAttributes,
    params: InvocationParameters,
    tools: ToolReconstructor,
    prompts: MessageReconstructor,
    completions: MessageReconstructor,
    metadata: MetadataBucket,
    resolved: Resolved,
}

impl<'a> Translator<'a> {
    fn new(config: &'a TranslatorConfig) -> Self {
        Self {
            config,
            out: OutputAttributes::new(),
            params: InvocationParameters::default(),
            tools: ToolReconstructor::default(),
            prompts: MessageReconstructor::new(Direction::Input),
            completions: MessageReconstructor::new(Direction::Output),
            metadata: MetadataBucket::default(),
            resolved: Resolved::default(),
        }
    }

    fn run(mut self, source: &SourceAttributes) -> OutputAttributes {
        let (flat, collisions) = flatten::flatten(source);
        step!(
            self.config,
            source_keys = source.len(),
            flat_keys = flat.len(),
            "flattened source attributes"
        );

        for (key, value) in &flat {
            if keys::is_context_key(key) {
                self.out
                    .insert_if_absent(key.as_str(), AttributeValue::from_json(value));
                step!(self.config, key = %key, "context attribute preserved");
            }
        }

        for (key, value) in &flat {
            if keys::is_context_key(key) {
                continue;
            }
            self.resolved.observe(key, value);
            let stage = self.claim(key, value);
            step!(self.config, key = %key, stage = ?stage, "claimed");
        }

        for (key, value) in &collisions {
            step!(self.config, key = %key, "flattened key collision kept in metadata");
            self.metadata.insert(key, value);
        }

        self.finish()
    }

    fn claim(&mut self, key: &str, value: &JsonValue) -> Stage {
        if let Some(bracketed) = flatten::bracket_candidate(key, self.config) {
            if self
                .out
                .insert_if_absent(bracketed, AttributeValue::from_json(value))
            {
                return Stage::Bracket;
            }
        } else if let Some((target, mapped)) = mapping::direct(key, value) {
            if self.out.insert_if_absent(target, mapped) {
                return Stage::Direct;
            }
        }

        if let Some(name) = params::parameter_name(key)
            && self.params.insert(name, value)
        {
            return Stage::InvocationParameters;
        }

        if self
            .tools
            .offer(key, value, &mut self.out, &mut self.metadata, self.config)
            == StageOutcome::Claimed
        {
            return Stage::Tools;
        }

        for messages in [&mut self.prompts, &mut self.completions] {
            if messages.offer(key, value) == StageOutcome::Claimed {
                return Stage::Messages;
            }
        }

        self.metadata.insert(key, value);
        Stage::Metadata
    }

    fn finish(mut self) -> OutputAttributes {
        self.tools
            .finish(&mut self.out, &mut self.metadata, self.config);
        self.prompts
            .finish(&mut self.out, &mut self.metadata, self.config);
        self.completions
            .finish(&mut self.out, &mut self.metadata, self.config);

        self.resolved.max_tokens = self.params.get("max_tokens").cloned();
        self.params.emit(&mut self.out);
        self.metadata.emit(&mut self.out, self.config);

        postprocess::apply(&mut self.out, &self.resolved, self.config);
        flatten::apply_bracket_notation(self.out, self.config)
    }
}

#[cfg(test)]
#[path = "translate_tests.rs"]
mod tests;
