//! In-memory capture of log events.
//!
//! [`InMemoryLogLayer`] records every `tracing` event into a
//! [`SharedLogStorage`], together with the fields of the spans it happened in.
//! Tests use it to assert on what was (and was not) logged.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use serde::Serialize;
use tracing::{Event, Id, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

/// Span fields copied onto every event recorded inside the span.
const CONTEXT_KEYS: &[&str] = &["session.id", "session_id", "document.id", "turn"];

/// One captured log event.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u128,
    /// Level name (`INFO`, `WARN`, ...).
    pub level: String,
    /// Event target, usually the module path.
    pub target: String,
    /// The formatted `message` field.
    pub message: String,
    /// Remaining event fields plus context fields inherited from spans.
    pub fields: HashMap<String, serde_json::Value>,
    /// Name of the innermost span the event was recorded in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

impl LogRecord {
    /// Whether `needle` occurs in the message or in any field value.
    pub fn mentions(&self, needle: &str) -> bool {
        self.message.contains(needle)
            || self.fields.values().any(|v| match v {
                serde_json::Value::String(s) => s.contains(needle),
                other => other.to_string().contains(needle),
            })
    }

    /// A field rendered as a string, if present.
    pub fn field_str(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Shared storage for captured log records.
#[derive(Debug, Clone, Default)]
pub struct SharedLogStorage {
    records: Arc<RwLock<Vec<LogRecord>>>,
}

impl SharedLogStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records captured so far, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Records carrying the given session id, directly or through a span.
    pub fn records_for_session(&self, session_id: &str) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| {
                ["session.id", "session_id"]
                    .iter()
                    .any(|k| r.field_str(k).as_deref() == Some(session_id))
            })
            .collect()
    }

    /// Records whose message equals `message`.
    pub fn find(&self, message: &str) -> Vec<LogRecord> {
        self.records().into_iter().filter(|r| r.message == message).collect()
    }

    /// Whether any record mentions `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        self.records.read().unwrap_or_else(PoisonError::into_inner).iter().any(|r| r.mentions(needle))
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn push(&self, record: LogRecord) {
        self.records.write().unwrap_or_else(PoisonError::into_inner).push(record);
    }
}

/// A tracing layer that captures events in memory.
pub struct InMemoryLogLayer {
    storage: Arc<SharedLogStorage>,
}

impl InMemoryLogLayer {
    pub fn new(storage: Arc<SharedLogStorage>) -> Self {
        Self { storage }
    }
}

#[derive(Clone, Default)]
struct SpanFields(HashMap<String, serde_json::Value>);

impl<S> Layer<S> for InMemoryLogLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        let mut fields = visitor.0;

        // Inherit context keys from the parent unless overridden.
        if let Some(parent) = span.parent() {
            if let Some(parent_fields) = parent.extensions().get::<SpanFields>() {
                for key in CONTEXT_KEYS {
                    if !fields.contains_key(*key) {
                        if let Some(value) = parent_fields.0.get(*key) {
                            fields.insert((*key).to_string(), value.clone());
                        }
                    }
                }
            }
        }

        span.extensions_mut().insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &tracing::span::Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);
        let mut fields = visitor.0;

        let message = match fields.remove("message") {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let current = ctx.event_span(event);
        if let Some(span) = &current {
            if let Some(span_fields) = span.extensions().get::<SpanFields>() {
                for key in CONTEXT_KEYS {
                    if let Some(value) = span_fields.0.get(*key) {
                        fields.entry((*key).to_string()).or_insert_with(|| value.clone());
                    }
                }
            }
        }

        let metadata = event.metadata();
        self.storage.push(LogRecord {
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            level: metadata.level().to_string(),
            target: metadata.target().to_string(),
            message,
            fields,
            span: current.map(|s| s.name().to_string()),
        });
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}
