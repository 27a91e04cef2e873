use std::sync::Arc;

use tracing::{info, info_span, warn};
use tracing_subscriber::layer::SubscriberExt;

use crate::memory::{InMemoryLogLayer, SharedLogStorage};

fn capture() -> (Arc<SharedLogStorage>, tracing::subscriber::DefaultGuard) {
    let storage = Arc::new(SharedLogStorage::new());
    let subscriber = tracing_subscriber::registry().with(InMemoryLogLayer::new(storage.clone()));
    let guard = tracing::subscriber::set_default(subscriber);
    (storage, guard)
}

#[test]
fn events_are_captured_with_fields() {
    let (storage, _guard) = capture();

    info!(chunk_count = 12u64, document.id = "paper", "ingested document");
    warn!(ok = false, "slow provider");

    let records = storage.records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].message, "ingested document");
    assert_eq!(records[0].level, "INFO");
    assert_eq!(records[0].fields["chunk_count"], serde_json::json!(12));
    assert_eq!(records[0].field_str("document.id").as_deref(), Some("paper"));
    assert_eq!(records[1].fields["ok"], serde_json::json!(false));
}

#[test]
fn session_id_is_inherited_from_spans() {
    let (storage, _guard) = capture();

    let outer = info_span!("session", session.id = "session-789");
    let _outer = outer.enter();
    let inner = info_span!("qa.answer", turn = 1u64);
    let _inner = inner.enter();
    info!("answer generated");

    let records = storage.records_for_session("session-789");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].span.as_deref(), Some("qa.answer"));
    assert_eq!(records[0].fields["turn"], serde_json::json!(1));
}

#[tokio::test]
async fn contains_text_searches_messages_and_fields() {
    let (storage, _guard) = capture();

    info!(model = "gpt-3.5-turbo", "sending chat completion");

    assert!(storage.contains_text("gpt-3.5"));
    assert!(storage.contains_text("chat completion"));
    assert!(!storage.contains_text("sk-"));
    assert_eq!(storage.find("sending chat completion").len(), 1);

    storage.clear();
    assert!(storage.is_empty());
}
