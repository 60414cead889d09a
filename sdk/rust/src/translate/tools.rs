//! Tool schema list reconstruction.
//!
//! A tool list arrives as a JSON string, a native list, an indexed map, or as
//! dotted fragments (`llm.request.functions.0.name`). All of them end up as
//! `llm.tools.<i>.<field>`.

use serde_json::{Map, Value as JsonValue};

use crate::config::TranslatorConfig;
use crate::keys;
use crate::value::{AttributeValue, OutputAttributes};

use super::metadata::MetadataBucket;
use super::{Collected, Entries, StageOutcome, collect_entries, split_index};

/// Whether `key` is a tool list key or one of its fragments.
pub(super) fn is_tool_key(key: &str) -> bool {
    keys::TOOL_LIST_KEYS.contains(&key) || fragment_rest(key).is_some()
}

/// The list key of a tool fragment and its `<index>[.<field>]` part.
fn fragment_rest(key: &str) -> Option<(&'static str, &str)> {
    keys::TOOL_LIST_KEYS.iter().find_map(|list_key| {
        key.strip_prefix(*list_key)
            .and_then(|rest| rest.strip_prefix('.'))
            .filter(|rest| split_index(rest).is_some())
            .map(|rest| (*list_key, rest))
    })
}

fn tool_entries(value: &JsonValue) -> Option<Collected> {
    collect_entries(value, Some("name")).filter(|collected| !collected.entries.is_empty())
}

/// Write `llm.tools.<i>.<field>` for every tool.
///
/// `<i>` is the position in the reconstructed list, not the source index,
/// so a lone `llm.request.functions.3.name` becomes `llm.tools.0.name`.
fn emit_tools(entries: &Entries, out: &mut OutputAttributes) {
    for (position, tool) in entries.values().enumerate() {
        for (field, value) in tool {
            out.insert_if_absent(
                format!("{}.{position}.{field}", keys::LLM_TOOLS),
                AttributeValue::from_json(value),
            );
        }
    }
}

/// Fragment waiting for the end of the pass.
#[derive(Debug)]
struct ToolFragment {
    key: String,
    rest: String,
    value: JsonValue,
}

#[derive(Debug, Default)]
pub(super) struct ToolReconstructor {
    whole_seen: bool,
    /// The list key the collected fragments belong to. Fragments of a
    /// second list are not mixed in.
    fragment_list: Option<&'static str>,
    fragments: Vec<ToolFragment>,
}

fn keep_shadowed(list_key: &str, collected: &mut Collected, metadata: &mut MetadataBucket) {
    for (path, value) in collected.shadowed.drain(..) {
        metadata.insert(&format!("{list_key}.{path}"), &value);
    }
}

impl ToolReconstructor {
    pub(super) fn offer(
        &mut self,
        key: &str,
        value: &JsonValue,
        out: &mut OutputAttributes,
        metadata: &mut MetadataBucket,
        config: &TranslatorConfig,
    ) -> StageOutcome {
        if keys::TOOL_LIST_KEYS.contains(&key) {
            if self.whole_seen {
                step!(config, key = %key, "tool list already reconstructed, skipping");
                return StageOutcome::Skipped;
            }
            let Some(mut collected) = tool_entries(value) else {
                step!(config, key = %key, "tool list payload unusable, skipping");
                return StageOutcome::Skipped;
            };
            step!(config, key = %key, tools = collected.entries.len(), "tool list reconstructed");
            keep_shadowed(key, &mut collected, metadata);
            emit_tools(&collected.entries, out);
            self.whole_seen = true;
            return StageOutcome::Claimed;
        }

        let Some((list_key, rest)) = fragment_rest(key) else {
            return StageOutcome::Skipped;
        };
        if self.fragment_list.is_some_and(|list| list != list_key)
            || self.fragments.iter().any(|f| f.rest == rest)
        {
            return StageOutcome::Skipped;
        }
        self.fragment_list = Some(list_key);
        self.fragments.push(ToolFragment {
            key: key.to_string(),
            rest: rest.to_string(),
            value: value.clone(),
        });
        StageOutcome::Claimed
    }

    /// Rebuild the list from fragments when no whole list was present.
    /// Otherwise the fragments are kept in the metadata bucket.
    pub(super) fn finish(
        self,
        out: &mut OutputAttributes,
        metadata: &mut MetadataBucket,
        config: &TranslatorConfig,
    ) {
        if self.fragments.is_empty() {
            return;
        }

        if self.whole_seen {
            for fragment in &self.fragments {
                metadata.insert(&fragment.key, &fragment.value);
            }
            return;
        }

        let list_key = self.fragment_list.unwrap_or(keys::LLM_REQUEST_FUNCTIONS);
        let assembled: Map<String, JsonValue> = self
            .fragments
            .into_iter()
            .map(|fragment| (fragment.rest, fragment.value))
            .collect();
        if let Some(mut collected) = tool_entries(&JsonValue::Object(assembled)) {
            step!(config, tools = collected.entries.len(), "tool list rebuilt from fragments");
            keep_shadowed(list_key, &mut collected, metadata);
            emit_tools(&collected.entries, out);
        }
    }
}
