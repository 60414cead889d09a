//! # oi-bridge
//!
//! Translate span attributes recorded under the OpenLLMetry (Traceloop)
//! naming convention into the OpenInference convention.
//!
//! OpenLLMetry stores chat messages, tool calls and tool schemas as flattened,
//! indexed keys (`gen_ai.prompt.0.content`) or as embedded structures. The
//! translator rebuilds those into OpenInference keys
//! (`llm.input_messages.0.message.content`), consolidates request parameters
//! into `llm.invocation_parameters` and catches everything else in `metadata`,
//! so nothing is dropped.
//!
//! ## Pipeline
//!
//! 1. Flattening pre-pass (one level of nested maps)
//! 2. Bracket notation for indexed keys outside reserved namespaces
//! 3. Direct key remapping
//! 4. Invocation parameter aggregation
//! 5. Tool list reconstruction
//! 6. Message list reconstruction
//! 7. Metadata fallback bucket
//! 8. Post-processing defaults and composite `input.value` / `output.value`
//!
//! ## Example
//!
//! ```
//! use oi_bridge::{TranslatorConfig, translate};
//!
//! let source = serde_json::json!({
//!     "gen_ai.system": "OpenAI",
//!     "gen_ai.prompt": {"0": {"role": "user", "content": "hi"}},
//! });
//! let source = source.as_object().cloned().unwrap_or_default();
//!
//! let out = translate(&source, &TranslatorConfig::default());
//! assert_eq!(out.get_str("llm.input_messages.0.message.content"), Some("hi"));
//! assert_eq!(out.get_str("llm.provider"), Some("openai"));
//! ```
//!
//! ## Span processing
//!
//! [`OpenInferenceSpanProcessor`] wraps another `SpanProcessor` and rewrites
//! every finished span before handing it on. Translation failures never reach
//! the tracing pipeline: the span is forwarded with its original attributes.

mod config;
mod error;
pub mod keys;
mod processor;
mod translate;
mod value;

pub use config::{ENV_DEBUG, ENV_DISABLE_BRACKETS, TranslatorConfig, is_truthy};
pub use error::TranslateError;
pub use processor::{AttributeTranslator, OpenInferenceSpanProcessor, OpenInferenceTranslator};
pub use translate::translate;
pub use value::{AttributeValue, OutputAttributes, SourceAttributes};
