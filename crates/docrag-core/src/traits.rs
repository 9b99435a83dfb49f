use async_trait::async_trait;

use crate::error::Result;
use crate::types::{IndexedPassage, OwnerFilter, ScoredPassage, StoredDocument};

/// Turns text into fixed-dimension vectors with a single configured model.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `bert:all-MiniLM-L6-v2:d384`).
    fn model_id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Durable store of passages with owner-filtered similarity search.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, passages: &[IndexedPassage]) -> Result<()>;

    /// Make every prior `upsert` durable and visible to readers of this handle.
    async fn persist(&self) -> Result<()>;

    /// Top `k` passages owned by `filter.owner_id`, most similar first.
    /// The filter is applied inside the search, before the top-k cut.
    async fn search(
        &self,
        query: &[f32],
        k: usize,
        filter: OwnerFilter,
    ) -> Result<Vec<ScoredPassage>>;

    async fn clear(&self) -> Result<()>;

    async fn count(&self) -> Result<usize>;
}

/// Produces a natural-language answer from a question and retrieved passages.
pub trait Synthesizer: Send + Sync {
    fn synthesize(&self, question: &str, passages: &[String]) -> Result<String>;
}

/// System of record that reindexing pulls from.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list_documents(&self) -> Result<Vec<StoredDocument>>;
}
