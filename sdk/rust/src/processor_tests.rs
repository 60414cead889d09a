use std::sync::{Arc, Mutex};

use opentelemetry::trace::{Span as _, Tracer as _, TracerProvider as _};
use opentelemetry_sdk::trace::SdkTracerProvider;

use super::*;

/// Records every span it receives.
#[derive(Debug, Clone, Default)]
struct Capture(Arc<Mutex<Vec<SpanData>>>);

impl Capture {
    fn spans(&self) -> Vec<SpanData> {
        self.0.lock().unwrap().clone()
    }
}

impl SpanProcessor for Capture {
    fn on_start(&self, _span: &mut opentelemetry_sdk::trace::Span, _cx: &opentelemetry::Context) {}

    fn on_end(&self, span: SpanData) {
        self.0.lock().unwrap().push(span);
    }

    fn force_flush(&self) -> OTelSdkResult {
        Ok(())
    }

    fn shutdown(&self) -> OTelSdkResult {
        Ok(())
    }
}

#[derive(Debug)]
struct Rejecting;

impl AttributeTranslator for Rejecting {
    fn translate(&self, _source: &SourceAttributes) -> Result<OutputAttributes, TranslateError> {
        Err(TranslateError::Rejected("simulated fault".to_string()))
    }
}

#[derive(Debug)]
struct Panicking;

impl AttributeTranslator for Panicking {
    fn translate(&self, _source: &SourceAttributes) -> Result<OutputAttributes, TranslateError> {
        panic!("simulated panic")
    }
}

fn record_span<P: SpanProcessor + 'static>(processor: P, attributes: Vec<KeyValue>) {
    let provider = SdkTracerProvider::builder()
        .with_span_processor(processor)
        .build();
    let tracer = provider.tracer("oi-bridge-test");
    let mut span = tracer.start("chat gpt-4");
    span.set_attributes(attributes);
    span.end();
}

fn attribute<'a>(span: &'a SpanData, key: &str) -> Option<&'a Value> {
    span.attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| &kv.value)
}

fn chat_attributes() -> Vec<KeyValue> {
    vec![
        KeyValue::new("gen_ai.system", "OpenAI"),
        KeyValue::new("gen_ai.request.model", "gpt-4"),
        KeyValue::new("gen_ai.prompt.0.role", "user"),
        KeyValue::new("gen_ai.prompt.0.content", "hi"),
        KeyValue::new("gen_ai.usage.prompt_tokens", 12_i64),
    ]
}

#[test]
fn test_span_attributes_translated() {
    let capture = Capture::default();
    let translator = OpenInferenceTranslator::with_config(TranslatorConfig::default());
    record_span(
        OpenInferenceSpanProcessor::with_translator(capture.clone(), translator),
        chat_attributes(),
    );

    let spans = capture.spans();
    assert_eq!(spans.len(), 1);
    let span = &spans[0];
    assert_eq!(
        attribute(span, "llm.input_messages.0.message.content"),
        Some(&Value::from("hi"))
    );
    assert_eq!(attribute(span, "llm.provider"), Some(&Value::from("openai")));
    assert_eq!(attribute(span, "llm.token_count.prompt"), Some(&Value::I64(12)));
    assert_eq!(attribute(span, "openinference.span.kind"), Some(&Value::from("LLM")));
    assert!(attribute(span, "gen_ai.prompt.0.content").is_none());
}

#[test]
fn test_rejected_translation_keeps_original_attributes() {
    let capture = Capture::default();
    record_span(
        OpenInferenceSpanProcessor::with_translator(capture.clone(), Rejecting),
        chat_attributes(),
    );

    let spans = capture.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(
        attribute(&spans[0], "gen_ai.prompt.0.content"),
        Some(&Value::from("hi"))
    );
    assert!(attribute(&spans[0], "llm.provider").is_none());
}

#[test]
fn test_panicking_translation_keeps_original_attributes() {
    let capture = Capture::default();
    record_span(
        OpenInferenceSpanProcessor::with_translator(capture.clone(), Panicking),
        chat_attributes(),
    );

    let spans = capture.spans();
    assert_eq!(spans.len(), 1);
    assert_eq!(
        attribute(&spans[0], "gen_ai.system"),
        Some(&Value::from("OpenAI"))
    );
}

#[test]
fn test_force_flush_and_shutdown_delegate() {
    let processor = OpenInferenceSpanProcessor::new(Capture::default());
    assert!(processor.force_flush().is_ok());
    assert!(processor.shutdown().is_ok());
}

#[test]
fn test_array_attributes_become_parameters() {
    let source = to_source(&[
        KeyValue::new(
            "llm.chat.stop_sequences",
            Value::Array(Array::String(vec!["END".into(), "STOP".into()])),
        ),
        KeyValue::new("llm.top_k", 3_i64),
    ]);
    let out = translate(&source, &TranslatorConfig::default());
    assert_eq!(
        out.get_str("llm.invocation_parameters"),
        Some(r#"{"stop_sequences":["END","STOP"],"top_k":3}"#)
    );
}

#[test]
fn test_otel_to_json() {
    assert_eq!(otel_to_json(&Value::Bool(true)), JsonValue::Bool(true));
    assert_eq!(otel_to_json(&Value::I64(7)), JsonValue::from(7));
    assert_eq!(otel_to_json(&Value::F64(0.5)), JsonValue::from(0.5));
    assert_eq!(otel_to_json(&Value::F64(f64::NAN)), JsonValue::from("NaN"));
    assert_eq!(
        otel_to_json(&Value::Array(Array::I64(vec![1, 2]))),
        serde_json::json!([1, 2])
    );
}

#[test]
fn test_to_key_values_keeps_types() {
    let mut out = OutputAttributes::new();
    out.insert_if_absent("a", AttributeValue::Bool(true));
    out.insert_if_absent("b", AttributeValue::Int(2));
    out.insert_if_absent("c", AttributeValue::Float(1.5));
    out.insert_if_absent("d", AttributeValue::from("x"));

    let kvs = to_key_values(out);
    assert_eq!(kvs[0].value, Value::Bool(true));
    assert_eq!(kvs[1].value, Value::I64(2));
    assert_eq!(kvs[2].value, Value::F64(1.5));
    assert_eq!(kvs[3].value, Value::from("x"));
}

#[test]
fn test_panic_message() {
    let payload = catch_unwind::<_, ()>(|| panic!("boom")).unwrap_err();
    assert_eq!(panic_message(payload), "boom");

    let payload = catch_unwind::<_, ()>(|| panic!("{}", String::from("owned"))).unwrap_err();
    assert_eq!(panic_message(payload), "owned");
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_translator_and_processor_are_send_sync() {
    assert_send_sync::<OpenInferenceTranslator>();
    assert_send_sync::<OpenInferenceSpanProcessor<Capture>>();
}

#[test]
fn test_translator_shared_across_threads() {
    let translator = OpenInferenceTranslator::with_config(TranslatorConfig::default());
    let source: SourceAttributes = serde_json::json!({
        "gen_ai.system": "OpenAI",
        "gen_ai.request.model": "gpt-4",
        "gen_ai.prompt.0.role": "user",
        "gen_ai.prompt.0.content": "hi",
        "custom.key": "value"
    })
    .as_object()
    .cloned()
    .unwrap();
    let expected = translator.translate(&source).unwrap();

    let results: Vec<OutputAttributes> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| translator.translate(&source).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.len(), 8);
    assert!(results.iter().all(|out| *out == expected));
}
