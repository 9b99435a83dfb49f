//! The retrieval-augmented query engine.
//!
//! A `RagEngine` is either FULL (all three components loaded) or DEGRADED
//! (fixed fallback answers). No public operation returns `Err` or panics:
//! failures come back as `IndexOutcome`, `ReindexReport` or an error-shaped
//! `QueryResult`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};

use docrag_core::config::Settings;
use docrag_core::traits::{Embedder, Synthesizer, VectorIndex};
use docrag_core::types::{
    ComponentState, EngineStatus, IndexOutcome, IndexedPassage, OperatingMode, OwnerFilter, OwnerId,
    QueryResult, ReindexReport, SourceDocument, NO_ANSWER,
};
use docrag_core::{Error, Result};

use crate::factory::{ComponentFactory, ModelFactory};

/// A loaded component set. `index_lock` gives searches the read side and
/// index mutation (`upsert + persist`, whole reindex runs) the write side.
struct Components {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    synthesizer: Arc<dyn Synthesizer>,
    index_lock: RwLock<()>,
}

enum EngineState {
    Full(Arc<Components>),
    Degraded(EngineStatus),
}

pub struct RagEngine {
    state: RwLock<EngineState>,
    factory: Arc<dyn ComponentFactory>,
    reload: Mutex<()>,
    top_k: usize,
    synthesis_timeout: Duration,
    clear_before_rebuild: bool,
}

fn degraded_status(
    embeddings: ComponentState,
    index: ComponentState,
    synthesizer: ComponentState,
) -> EngineStatus {
    EngineStatus { mode: OperatingMode::Degraded, embeddings, index, synthesizer }
}

/// Load embeddings, then the index, then the synthesizer. The first failure
/// stops the sequence.
async fn load_components(
    factory: &dyn ComponentFactory,
) -> std::result::Result<Components, EngineStatus> {
    use ComponentState::{Failed, NotAttempted, Ready};

    let embedder = factory.embedder().await.map_err(|e| {
        tracing::error!(error = %e, "embedding model failed to initialise");
        degraded_status(Failed(e.to_string()), NotAttempted, NotAttempted)
    })?;
    let index = factory.index(embedder.dim()).await.map_err(|e| {
        tracing::error!(error = %e, "vector index failed to initialise");
        degraded_status(Ready, Failed(e.to_string()), NotAttempted)
    })?;
    let synthesizer = factory.synthesizer().await.map_err(|e| {
        tracing::error!(error = %e, "answer synthesizer failed to initialise");
        degraded_status(Ready, Ready, Failed(e.to_string()))
    })?;
    tracing::info!(embedder = embedder.model_id(), dim = embedder.dim(), "engine components ready");
    Ok(Components { embedder, index, synthesizer, index_lock: RwLock::new(()) })
}

async fn embed(embedder: &Arc<dyn Embedder>, text: &str) -> Result<Vec<f32>> {
    let embedder = Arc::clone(embedder);
    let text = text.to_string();
    tokio::task::spawn_blocking(move || embedder.embed(&text))
        .await
        .map_err(|e| Error::Embedding(format!("embedding task failed: {}", e)))?
}

impl RagEngine {
    /// Build an engine, loading every component through `factory`.
    ///
    /// Never fails: a component that cannot be loaded is logged and the
    /// engine starts DEGRADED.
    pub async fn initialize(settings: &Settings, factory: Arc<dyn ComponentFactory>) -> Self {
        let state = match load_components(factory.as_ref()).await {
            Ok(components) => EngineState::Full(Arc::new(components)),
            Err(status) => {
                tracing::warn!("engine starting in degraded mode");
                EngineState::Degraded(status)
            }
        };
        Self {
            state: RwLock::new(state),
            factory,
            reload: Mutex::new(()),
            top_k: settings.engine.top_k,
            synthesis_timeout: Duration::from_secs(settings.engine.synthesis_timeout_secs),
            clear_before_rebuild: settings.reindex.clear_before_rebuild,
        }
    }

    /// `initialize` with the default model-backed factory.
    pub async fn from_settings(settings: &Settings) -> Self {
        Self::initialize(settings, Arc::new(ModelFactory::new(settings.clone()))).await
    }

    async fn components(&self) -> Option<Arc<Components>> {
        match &*self.state.read().await {
            EngineState::Full(components) => Some(Arc::clone(components)),
            EngineState::Degraded(_) => None,
        }
    }

    pub async fn mode(&self) -> OperatingMode {
        match &*self.state.read().await {
            EngineState::Full(_) => OperatingMode::Full,
            EngineState::Degraded(_) => OperatingMode::Degraded,
        }
    }

    pub async fn get_status(&self) -> EngineStatus {
        match &*self.state.read().await {
            EngineState::Full(_) => EngineStatus {
                mode: OperatingMode::Full,
                embeddings: ComponentState::Ready,
                index: ComponentState::Ready,
                synthesizer: ComponentState::Ready,
            },
            EngineState::Degraded(status) => status.clone(),
        }
    }

    /// Retry loading every component. On success the new set replaces the
    /// degraded state; on failure the engine stays degraded with the new
    /// reasons. A FULL engine is left untouched.
    pub async fn reinitialize(&self) -> OperatingMode {
        let _reload = self.reload.lock().await;
        if self.mode().await == OperatingMode::Full {
            return OperatingMode::Full;
        }
        tracing::info!("retrying engine initialisation");
        let (next, mode) = match load_components(self.factory.as_ref()).await {
            Ok(components) => (EngineState::Full(Arc::new(components)), OperatingMode::Full),
            Err(status) => (EngineState::Degraded(status), OperatingMode::Degraded),
        };
        *self.state.write().await = next;
        if mode == OperatingMode::Full {
            tracing::info!("engine recovered to full mode");
        }
        mode
    }

    /// Embed `content` and store it as one passage, durable on return.
    pub async fn index_document(
        &self,
        content: &str,
        source: &str,
        owner_id: OwnerId,
    ) -> IndexOutcome {
        let Some(components) = self.components().await else {
            tracing::warn!(source, owner_id, "engine degraded; document not indexed");
            return IndexOutcome::Skipped;
        };
        match self.index_one(&components, content, source, owner_id).await {
            Ok(()) => {
                tracing::info!(source, owner_id, "document indexed");
                IndexOutcome::Indexed
            }
            Err(e) => {
                tracing::error!(source, owner_id, error = %e, "indexing failed");
                IndexOutcome::Failed(e.to_string())
            }
        }
    }

    async fn index_one(
        &self,
        components: &Components,
        content: &str,
        source: &str,
        owner_id: OwnerId,
    ) -> Result<()> {
        let vector = embed(&components.embedder, content).await?;
        let passage = IndexedPassage {
            vector,
            text: content.to_string(),
            owner_id,
            source: source.to_string(),
        };
        let _write = components.index_lock.write().await;
        components.index.upsert(std::slice::from_ref(&passage)).await?;
        components.index.persist().await
    }

    /// Answer `query` from the caller's own documents.
    pub async fn query_document(&self, owner_id: OwnerId, query: &str) -> QueryResult {
        let Some(components) = self.components().await else {
            tracing::warn!(owner_id, "engine degraded; returning minimal-mode answer");
            return QueryResult::degraded();
        };
        match self.answer(&components, owner_id, query).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(owner_id, error = %e, "query failed");
                QueryResult::error(e)
            }
        }
    }

    async fn answer(
        &self,
        components: &Components,
        owner_id: OwnerId,
        query: &str,
    ) -> Result<QueryResult> {
        let vector = embed(&components.embedder, query).await?;
        let hits = {
            let _read = components.index_lock.read().await;
            components.index.search(&vector, self.top_k, OwnerFilter::new(owner_id)).await?
        };
        tracing::debug!(owner_id, hits = hits.len(), "passages retrieved");

        let sources: Vec<String> = hits.iter().map(|h| h.passage.source.clone()).collect();
        let passages: Vec<String> = hits.into_iter().map(|h| h.passage.text).collect();
        let answer = self.synthesize(components, query, passages).await?;
        Ok(QueryResult { answer, sources })
    }

    async fn synthesize(
        &self,
        components: &Components,
        question: &str,
        passages: Vec<String>,
    ) -> Result<String> {
        let synthesizer = Arc::clone(&components.synthesizer);
        let question = question.to_string();
        let task =
            tokio::task::spawn_blocking(move || synthesizer.synthesize(&question, &passages));
        let answer = match tokio::time::timeout(self.synthesis_timeout, task).await {
            Err(_) => return Err(Error::Timeout(self.synthesis_timeout)),
            Ok(joined) => joined
                .map_err(|e| Error::Synthesis(format!("synthesis task failed: {}", e)))??,
        };
        Ok(if answer.trim().is_empty() { NO_ANSWER.to_string() } else { answer })
    }

    /// Rebuild the index from `documents`.
    ///
    /// Holds the index write lock for the whole run, so concurrent queries
    /// see either the old contents or the finished rebuild.
    pub async fn reindex_all(&self, documents: Vec<SourceDocument>) -> ReindexReport {
        let Some(components) = self.components().await else {
            tracing::warn!(documents = documents.len(), "engine degraded; reindex skipped");
            return ReindexReport { degraded: true, ..Default::default() };
        };

        let mut report = ReindexReport::default();
        let _write = components.index_lock.write().await;
        if self.clear_before_rebuild {
            if let Err(e) = components.index.clear().await {
                tracing::error!(error = %e, "clearing index before reindex failed");
                report.error = Some(e.to_string());
                return report;
            }
            report.cleared = true;
        }

        for doc in &documents {
            let Some(content) = doc.indexable_content() else {
                report.skipped_empty += 1;
                continue;
            };
            let stored = async {
                let vector = embed(&components.embedder, content).await?;
                let passage = IndexedPassage {
                    vector,
                    text: content.to_string(),
                    owner_id: doc.owner_id,
                    source: doc.source.clone(),
                };
                components.index.upsert(std::slice::from_ref(&passage)).await
            };
            match stored.await {
                Ok(()) => report.indexed += 1,
                Err(e) => {
                    tracing::error!(
                        source = %doc.source,
                        owner_id = doc.owner_id,
                        error = %e,
                        "reindexing document failed"
                    );
                    report.failed += 1;
                }
            }
        }

        if let Err(e) = components.index.persist().await {
            tracing::error!(error = %e, "persisting reindexed passages failed");
            report.error = Some(e.to_string());
        }
        tracing::info!(
            indexed = report.indexed,
            skipped = report.skipped_empty,
            failed = report.failed,
            cleared = report.cleared,
            "reindex finished"
        );
        report
    }
}
