//! OpenTelemetry span processor that rewrites attributes on span end.

use std::any::Any;
use std::fmt::Debug;
use std::panic::{AssertUnwindSafe, catch_unwind};

use opentelemetry::{Array, KeyValue, Value};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::trace::{SpanData, SpanProcessor};
use serde_json::Value as JsonValue;

use crate::config::TranslatorConfig;
use crate::error::TranslateError;
use crate::translate::translate;
use crate::value::{AttributeValue, OutputAttributes, SourceAttributes};

// ============================================================================
// TRANSLATOR SEAM
// ============================================================================

/// Attribute translation step run by [`OpenInferenceSpanProcessor`].
pub trait AttributeTranslator: Send + Sync + Debug {
    fn translate(&self, source: &SourceAttributes) -> Result<OutputAttributes, TranslateError>;
}

/// The OpenLLMetry → OpenInference translator.
///
/// Without an explicit config the environment is read on every call, so flag
/// changes apply to the next span.
#[derive(Debug, Default, Clone)]
pub struct OpenInferenceTranslator {
    config: Option<TranslatorConfig>,
}

impl OpenInferenceTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TranslatorConfig) -> Self {
        Self {
            config: Some(config),
        }
    }
}

impl AttributeTranslator for OpenInferenceTranslator {
    fn translate(&self, source: &SourceAttributes) -> Result<OutputAttributes, TranslateError> {
        let config = self.config.unwrap_or_else(TranslatorConfig::from_env);
        Ok(translate(source, &config))
    }
}

// ============================================================================
// ATTRIBUTE CONVERSION
// ============================================================================

fn float_to_json(f: f64) -> JsonValue {
    serde_json::Number::from_f64(f)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(f.to_string()))
}

fn otel_to_json(value: &Value) -> JsonValue {
    match value {
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::I64(i) => JsonValue::from(*i),
        Value::F64(f) => float_to_json(*f),
        Value::String(s) => JsonValue::String(s.as_str().to_string()),
        Value::Array(array) => match array {
            Array::Bool(items) => items.iter().copied().map(JsonValue::Bool).collect(),
            Array::I64(items) => items.iter().copied().map(JsonValue::from).collect(),
            Array::F64(items) => items.iter().copied().map(float_to_json).collect(),
            Array::String(items) => items
                .iter()
                .map(|s| JsonValue::String(s.as_str().to_string()))
                .collect(),
            _ => JsonValue::String(value.to_string()),
        },
        _ => JsonValue::String(value.to_string()),
    }
}

fn to_source(attributes: &[KeyValue]) -> SourceAttributes {
    let mut source = SourceAttributes::new();
    for kv in attributes {
        source
            .entry(kv.key.as_str())
            .or_insert_with(|| otel_to_json(&kv.value));
    }
    source
}

fn to_key_values(out: OutputAttributes) -> Vec<KeyValue> {
    out.into_iter()
        .map(|(key, value)| match value {
            AttributeValue::Bool(b) => KeyValue::new(key, b),
            AttributeValue::Int(i) => KeyValue::new(key, i),
            AttributeValue::Float(f) => KeyValue::new(key, f),
            AttributeValue::String(s) => KeyValue::new(key, s),
        })
        .collect()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// SPAN PROCESSOR
// ============================================================================

/// Wraps another span processor and translates every finished span's
/// attributes before passing it on.
///
/// Translation fails open: on error or panic the span is forwarded with its
/// original attributes.
///
/// ```
/// use oi_bridge::OpenInferenceSpanProcessor;
/// use opentelemetry_sdk::trace::{SdkTracerProvider, SpanProcessor};
///
/// fn install<P: SpanProcessor + 'static>(exporting: P) -> SdkTracerProvider {
///     SdkTracerProvider::builder()
///         .with_span_processor(OpenInferenceSpanProcessor::new(exporting))
///         .build()
/// }
/// ```
#[derive(Debug)]
pub struct OpenInferenceSpanProcessor<P, T = OpenInferenceTranslator> {
    inner: P,
    translator: T,
}

impl<P: SpanProcessor> OpenInferenceSpanProcessor<P> {
    pub fn new(inner: P) -> Self {
        Self::with_translator(inner, OpenInferenceTranslator::new())
    }
}

impl<P: SpanProcessor, T: AttributeTranslator> OpenInferenceSpanProcessor<P, T> {
    pub fn with_translator(inner: P, translator: T) -> Self {
        Self { inner, translator }
    }

    fn translate_span(&self, span: &mut SpanData) -> Result<(), TranslateError> {
        let source = to_source(&span.attributes);
        let translated = catch_unwind(AssertUnwindSafe(|| self.translator.translate(&source)))
            .unwrap_or_else(|payload| Err(TranslateError::Panicked(panic_message(payload))))?;
        span.attributes = to_key_values(translated);
        Ok(())
    }
}

impl<P: SpanProcessor, T: AttributeTranslator> SpanProcessor for OpenInferenceSpanProcessor<P, T> {
    fn on_start(&self, span: &mut opentelemetry_sdk::trace::Span, cx: &opentelemetry::Context) {
        self.inner.on_start(span, cx);
    }

    fn on_end(&self, mut span: SpanData) {
        if let Err(e) = self.translate_span(&mut span)
            && TranslatorConfig::from_env().debug
        {
            tracing::debug!(
                span = %span.name,
                error = %e,
                "attribute translation failed, forwarding original attributes"
            );
        }
        self.inner.on_end(span);
    }

    fn force_flush(&self) -> OTelSdkResult {
        self.inner.force_flush()
    }

    fn shutdown(&self) -> OTelSdkResult {
        self.inner.shutdown()
    }

    fn set_resource(&mut self, resource: &opentelemetry_sdk::Resource) {
        self.inner.set_resource(resource);
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
