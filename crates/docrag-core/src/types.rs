//! Domain types shared by the embedding, index, synthesis and engine crates.

use serde::{Deserialize, Serialize};

/// Identifier of the user that owns a document. Every read path filters on it.
pub type OwnerId = i64;

/// Answer returned while the engine runs without its models.
pub const DEGRADED_ANSWER: &str = "RAGService is in minimal mode";

/// Answer returned when generation produced no text.
pub const NO_ANSWER: &str = "No answer generated.";

/// One indexed unit of text: a document's full extracted content together
/// with its embedding, owner and human-readable source label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedPassage {
    pub vector: Vec<f32>,
    pub text: String,
    pub owner_id: OwnerId,
    pub source: String,
}

/// A passage returned by a similarity search. `score` is a similarity,
/// higher is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPassage {
    pub passage: IndexedPassage,
    pub score: f32,
}

/// Metadata filter applied inside every vector search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerFilter {
    pub owner_id: OwnerId,
}

impl OwnerFilter {
    pub fn new(owner_id: OwnerId) -> Self {
        Self { owner_id }
    }
}

/// Answer plus the sources of every retrieved passage, in retrieval order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
}

impl QueryResult {
    pub fn degraded() -> Self {
        Self { answer: DEGRADED_ANSWER.to_string(), sources: Vec::new() }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self { answer: format!("Error: {message}"), sources: Vec::new() }
    }
}

/// A document handed to the engine for (re)indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: Option<String>,
    pub source: String,
    pub owner_id: OwnerId,
}

impl SourceDocument {
    pub fn new(content: impl Into<String>, source: impl Into<String>, owner_id: OwnerId) -> Self {
        Self { content: Some(content.into()), source: source.into(), owner_id }
    }

    /// Content worth indexing, or `None` for absent / empty content.
    pub fn indexable_content(&self) -> Option<&str> {
        self.content.as_deref().filter(|c| !c.is_empty())
    }
}

/// A document row as the system of record holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub content: Option<String>,
    pub original_filename: String,
    pub user_id: OwnerId,
}

impl From<StoredDocument> for SourceDocument {
    fn from(doc: StoredDocument) -> Self {
        Self { content: doc.content, source: doc.original_filename, owner_id: doc.user_id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingMode {
    Full,
    Degraded,
}

/// Load state of a single engine component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum ComponentState {
    Ready,
    Failed(String),
    /// An earlier component failed, so this one was never loaded.
    NotAttempted,
}

impl ComponentState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// Snapshot of engine health, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatus {
    pub mode: OperatingMode,
    pub embeddings: ComponentState,
    pub index: ComponentState,
    pub synthesizer: ComponentState,
}

/// The three-boolean status view. In degraded mode every flag reads `true`
/// ("ready" in the minimal sense).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyStatus {
    pub embeddings_ready: bool,
    pub index_ready: bool,
    pub synthesizer_ready: bool,
}

impl EngineStatus {
    pub fn legacy_flags(&self) -> LegacyStatus {
        let degraded = self.mode == OperatingMode::Degraded;
        LegacyStatus {
            embeddings_ready: degraded || self.embeddings.is_ready(),
            index_ready: degraded || self.index.is_ready(),
            synthesizer_ready: degraded || self.synthesizer.is_ready(),
        }
    }
}

/// Result of a single `index_document` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexOutcome {
    Indexed,
    /// The engine is degraded; nothing was written.
    Skipped,
    /// The failure was logged and swallowed.
    Failed(String),
}

/// Summary of a `reindex_all` run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexReport {
    pub indexed: usize,
    pub skipped_empty: usize,
    pub failed: usize,
    pub cleared: bool,
    /// Set when the run was a no-op because the engine is degraded.
    pub degraded: bool,
    pub error: Option<String>,
}
