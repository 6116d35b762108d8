//! End-to-end session tests over the real store with instant latency.

use core_types::Severity;
use core_types::config::{AppConfig, BackendConfig};
use indexer::{IndexOutcome, IndexingState};
use service::{MemoryNotifier, Session, bootstrap};
use std::sync::Arc;

fn instant_config() -> AppConfig {
    AppConfig {
        backend: BackendConfig::instant(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn demo_folder_indexes_end_to_end() {
    let notifier = Arc::new(MemoryNotifier::new());
    let session = Session::demo(&instant_config(), notifier.clone());

    let folder = session.store().folder(&"folder1".into()).unwrap();
    let outcome = session.queue().request_folder_index(&folder).await;
    assert_eq!(outcome, IndexOutcome::Started);

    session.queue().wait_idle().await;

    for id in ["1", "2"] {
        let doc = session.store().document(&id.into()).unwrap();
        let d = doc.read();
        assert!(d.indexed, "document {id} should be indexed");
        assert!(d.indexation_time.is_some());
    }
    assert!(!session.queue().is_item_indexing(&"folder1".into()));
    assert!(session.registry().is_empty());

    // Statistics refresh on fetch and now reflect the completed folder.
    session.store().fetch_items(None).await;
    assert_eq!(folder.read().statistics.indexed_count, 2);

    let messages: Vec<String> = notifier
        .entries()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert!(messages.iter().any(|m| m.contains("Folder indexation complete")));
}

#[tokio::test]
async fn repeated_document_requests_surface_as_rejections() {
    let notifier = Arc::new(MemoryNotifier::new());
    let session = Session::demo(&instant_config(), notifier.clone());

    let doc = session.store().document(&"3".into()).unwrap();
    assert_eq!(
        session.queue().request_document_index(&doc).await,
        IndexOutcome::Completed
    );
    assert_eq!(
        session.queue().request_document_index(&doc).await,
        IndexOutcome::AlreadyIndexed
    );

    let entries = notifier.entries();
    assert!(
        entries
            .iter()
            .any(|n| n.severity == Severity::Positive && n.message.contains("indexed successfully"))
    );
    assert!(
        entries
            .iter()
            .any(|n| n.severity == Severity::Info && n.message.contains("already indexed"))
    );
}

#[tokio::test]
async fn reset_rebuilds_controller_without_leaking_state() {
    let notifier = Arc::new(MemoryNotifier::new());
    let mut session = Session::new(&instant_config(), notifier);

    // Simulate an entry left behind by an interrupted test or crash.
    session
        .registry()
        .insert("stale".into(), IndexingState::document(0));
    assert!(!session.registry().is_empty());

    session.reset();

    assert!(session.registry().is_empty());
    assert!(!session.queue().is_busy());
    assert_eq!(session.queue().queued_documents(), 0);
}

#[test]
fn bootstrap_writes_default_config_and_installs_tracing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docshelf.toml");

    let (cfg, guard) = bootstrap(Some(&path)).unwrap();

    assert!(path.exists());
    assert_eq!(cfg, AppConfig::default());
    assert!(guard.is_none());
}
