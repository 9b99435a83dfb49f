//! Retrieval-augmented query engine over the embedding, index and synthesis
//! crates, with reindexing from a document store and optional background
//! recovery from degraded mode.

pub mod engine;
pub mod factory;
pub mod recovery;
pub mod reindex;
pub mod store;

pub use engine::RagEngine;
pub use factory::{ComponentFactory, ModelFactory};
pub use recovery::{spawn_recovery, RecoveryPolicy};
pub use reindex::ReindexCoordinator;
pub use store::DirectoryDocumentStore;
