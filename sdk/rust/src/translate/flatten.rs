//! Flattening pre-pass and bracket notation.

use serde_json::Value as JsonValue;

use crate::config::TranslatorConfig;
use crate::keys;
use crate::value::{OutputAttributes, SourceAttributes};

use super::{Shadowed, parse_index};

/// Expand one level of nested maps into dotted keys.
///
/// Context and preserve keys keep their nested value so later stages see the
/// original shape. Deeper levels stay nested. Empty maps are kept as-is.
///
/// When an expanded key is already taken the first value keeps the key and
/// the later one is returned in the collision list.
pub(super) fn flatten(source: &SourceAttributes) -> (SourceAttributes, Shadowed) {
    let mut flat = SourceAttributes::new();
    let mut collisions = Shadowed::new();
    let mut place = |key: String, value: &JsonValue| {
        if flat.contains_key(&key) {
            collisions.push((key, value.clone()));
        } else {
            flat.insert(key, value.clone());
        }
    };

    for (key, value) in source {
        match value {
            JsonValue::Object(inner)
                if !inner.is_empty() && !keys::is_context_key(key) && !keys::is_preserve_key(key) =>
            {
                for (inner_key, inner_value) in inner {
                    place(format!("{key}.{inner_key}"), inner_value);
                }
            }
            _ => place(key.clone(), value),
        }
    }
    (flat, collisions)
}

fn is_reserved(key: &str) -> bool {
    keys::BRACKET_RESERVED_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
}

/// Rewrite every all-digit segment after the first as `[n]`.
///
/// Returns `None` when the key has no such segment.
pub(super) fn to_bracket_notation(key: &str) -> Option<String> {
    let mut out = String::with_capacity(key.len() + 2);
    let mut changed = false;
    for (i, segment) in key.split('.').enumerate() {
        if i > 0 && parse_index(segment).is_some() {
            out.push('[');
            out.push_str(segment);
            out.push(']');
            changed = true;
        } else {
            if i > 0 {
                out.push('.');
            }
            out.push_str(segment);
        }
    }
    changed.then_some(out)
}

/// Bracketed form of `key`, if the key should be rewritten at all.
pub(super) fn bracket_candidate(key: &str, config: &TranslatorConfig) -> Option<String> {
    if config.disable_brackets || is_reserved(key) {
        return None;
    }
    to_bracket_notation(key)
}

/// Final bracket pass over the assembled output.
///
/// A key is renamed only when its bracketed form is not already taken.
pub(super) fn apply_bracket_notation(
    mut out: OutputAttributes,
    config: &TranslatorConfig,
) -> OutputAttributes {
    if config.disable_brackets {
        return out;
    }

    let renames: Vec<(String, String)> = out
        .keys()
        .filter_map(|key| bracket_candidate(key, config).map(|new| (key.clone(), new)))
        .collect();

    for (old, new) in renames {
        if out.contains_key(&new) {
            continue;
        }
        if let Some(value) = out.remove(&old) {
            step!(config, from = %old, to = %new, "bracket notation applied");
            out.insert_if_absent(new, value);
        }
    }
    out
}
