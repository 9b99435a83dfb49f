mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use docrag_core::traits::DocumentStore;
use docrag_core::types::StoredDocument;
use docrag_core::{Error, Result};
use docrag_engine::{DirectoryDocumentStore, ReindexCoordinator};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, bytes: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

fn seed_documents(root: &Path) {
    write(root, "7/geo.txt", b"The capital of France is Paris.");
    write(root, "7/empty.txt", b"");
    write(root, "8/notes/pumps.txt", b"The well pump needs a new pressure switch.");
    write(root, "8/latin1.txt", &[b'c', b'a', b'f', 0xe9, b' ', b'm', b'e', b'n', b'u']);
    write(root, "shared/ignored.txt", b"not owned by anyone");
    write(root, "README.txt", b"top-level file");
}

#[tokio::test]
async fn directory_store_lists_user_documents() {
    let tmp = TempDir::new().unwrap();
    seed_documents(tmp.path());
    let store = DirectoryDocumentStore::new(tmp.path());

    let docs = store.list_documents().await.unwrap();
    let mut names: Vec<(i64, String)> =
        docs.iter().map(|d| (d.user_id, d.original_filename.clone())).collect();
    names.sort();
    let notes = Path::new("notes").join("pumps.txt").to_string_lossy().to_string();
    assert_eq!(
        names,
        vec![
            (7, "empty.txt".to_string()),
            (7, "geo.txt".to_string()),
            (8, "latin1.txt".to_string()),
            (8, notes),
        ]
    );

    let latin = docs.iter().find(|d| d.original_filename == "latin1.txt").unwrap();
    let content = latin.content.as_deref().unwrap();
    assert!(content.starts_with("caf"));
    assert!(content.ends_with(" menu"));
}

#[tokio::test]
async fn missing_document_directory_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let store = DirectoryDocumentStore::new(tmp.path().join("absent"));
    assert!(matches!(store.list_documents().await, Err(Error::Io(_))));
}

#[tokio::test]
async fn coordinator_rebuilds_from_store() {
    let docs_dir = TempDir::new().unwrap();
    let index_dir = TempDir::new().unwrap();
    seed_documents(docs_dir.path());

    let engine = Arc::new(engine_with(&test_settings(), StubFactory::new(index_dir.path())).await);
    let store = Arc::new(DirectoryDocumentStore::new(docs_dir.path()));
    let coordinator = ReindexCoordinator::new(Arc::clone(&engine), store, false);

    let report = coordinator.reindex_now().await;
    assert_eq!(report.indexed, 3);
    assert_eq!(report.skipped_empty, 1);
    assert!(report.error.is_none());
    assert_eq!(stored_count(index_dir.path()).await, 3);

    let result = engine.query_document(7, "What is the capital of France?").await;
    assert_eq!(result.sources, vec!["geo.txt".to_string()]);
}

#[tokio::test]
async fn startup_reindex_respects_flag() {
    let docs_dir = TempDir::new().unwrap();
    let index_dir = TempDir::new().unwrap();
    seed_documents(docs_dir.path());
    let engine = Arc::new(engine_with(&test_settings(), StubFactory::new(index_dir.path())).await);
    let store: Arc<dyn DocumentStore> = Arc::new(DirectoryDocumentStore::new(docs_dir.path()));

    let disabled = ReindexCoordinator::new(Arc::clone(&engine), Arc::clone(&store), false);
    assert!(disabled.reindex_on_startup().await.is_none());
    assert_eq!(stored_count(index_dir.path()).await, 0);

    let enabled = ReindexCoordinator::new(engine, store, true);
    let report = enabled.reindex_on_startup().await.unwrap();
    assert_eq!(report.indexed, 3);
}

struct FailingStore;

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list_documents(&self) -> Result<Vec<StoredDocument>> {
        let offline =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "database offline");
        Err(Error::Io(offline))
    }
}

#[tokio::test]
async fn store_failure_is_reported_not_raised() {
    let index_dir = TempDir::new().unwrap();
    let engine = Arc::new(engine_with(&test_settings(), StubFactory::new(index_dir.path())).await);
    let coordinator = ReindexCoordinator::new(engine, Arc::new(FailingStore), false);

    let report = coordinator.reindex_now().await;
    assert!(report.error.as_deref().unwrap().contains("database offline"));
    assert_eq!(report.indexed, 0);
}

#[tokio::test]
async fn degraded_engine_reindex_is_noop() {
    let docs_dir = TempDir::new().unwrap();
    let index_dir = TempDir::new().unwrap();
    seed_documents(docs_dir.path());
    let factory = StubFactory::new(index_dir.path()).failing_embedder_loads(1);
    let engine = Arc::new(engine_with(&test_settings(), factory).await);
    let store = Arc::new(DirectoryDocumentStore::new(docs_dir.path()));
    let coordinator = ReindexCoordinator::new(engine, store, true);

    let report = coordinator.reindex_on_startup().await.unwrap();
    assert!(report.degraded);
    assert_eq!(report.indexed, 0);
}
