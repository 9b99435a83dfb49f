use std::sync::Arc;

use async_trait::async_trait;

use docrag_core::config::Settings;
use docrag_core::traits::{Embedder, Synthesizer, VectorIndex};
use docrag_core::{Error, Result};
use docrag_embed::load_embedder;
use docrag_synth::load_synthesizer;
use docrag_vector::LanceVectorIndex;

/// Builds the engine's components. The engine calls these in order and
/// stops at the first failure.
#[async_trait]
pub trait ComponentFactory: Send + Sync {
    async fn embedder(&self) -> Result<Arc<dyn Embedder>>;

    /// `dim` is the width of the embedder that was just loaded.
    async fn index(&self, dim: usize) -> Result<Arc<dyn VectorIndex>>;

    async fn synthesizer(&self) -> Result<Arc<dyn Synthesizer>>;
}

/// Default factory: local model weights and a LanceDB index, as configured.
pub struct ModelFactory {
    settings: Settings,
}

impl ModelFactory {
    pub fn new(settings: Settings) -> Self { Self { settings } }
}

#[async_trait]
impl ComponentFactory for ModelFactory {
    async fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let settings = self.settings.embedding.clone();
        tokio::task::spawn_blocking(move || load_embedder(&settings))
            .await
            .map_err(|e| Error::ModelUnavailable(format!("loader task failed: {}", e)))?
    }

    async fn index(&self, dim: usize) -> Result<Arc<dyn VectorIndex>> {
        let index =
            LanceVectorIndex::open(&self.settings.index.dir, &self.settings.index.table, dim)
                .await?;
        Ok(Arc::new(index))
    }

    async fn synthesizer(&self) -> Result<Arc<dyn Synthesizer>> {
        let settings = self.settings.synthesis.clone();
        tokio::task::spawn_blocking(move || load_synthesizer(&settings))
            .await
            .map_err(|e| Error::SynthesisUnavailable(format!("loader task failed: {}", e)))?
    }
}
