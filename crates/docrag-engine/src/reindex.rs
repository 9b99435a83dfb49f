use std::sync::Arc;

use docrag_core::traits::DocumentStore;
use docrag_core::types::{ReindexReport, SourceDocument};

use crate::engine::RagEngine;

/// Pulls every document from the system of record and rebuilds the index.
pub struct ReindexCoordinator {
    engine: Arc<RagEngine>,
    store: Arc<dyn DocumentStore>,
    on_startup: bool,
}

impl ReindexCoordinator {
    pub fn new(engine: Arc<RagEngine>, store: Arc<dyn DocumentStore>, on_startup: bool) -> Self {
        Self { engine, store, on_startup }
    }

    pub async fn reindex_now(&self) -> ReindexReport {
        let documents = match self.store.list_documents().await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::error!(error = %e, "listing documents for reindex failed");
                return ReindexReport { error: Some(e.to_string()), ..Default::default() };
            }
        };
        tracing::info!(documents = documents.len(), "reindexing from document store");
        let documents: Vec<SourceDocument> =
            documents.into_iter().map(SourceDocument::from).collect();
        self.engine.reindex_all(documents).await
    }

    /// Run a reindex when startup reindexing is enabled, else `None`.
    pub async fn reindex_on_startup(&self) -> Option<ReindexReport> {
        if !self.on_startup {
            tracing::debug!("startup reindex disabled");
            return None;
        }
        Some(self.reindex_now().await)
    }
}
