use std::time::Duration;

use thiserror::Error;

/// Failures raised by engine components.
///
/// The first three variants are initialisation failures and push an engine
/// into degraded mode. The rest happen during an operation and are contained
/// by the engine boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Synthesis model unavailable: {0}")]
    SynthesisUnavailable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Vector index operation failed: {0}")]
    Index(String),

    #[error("Answer synthesis failed: {0}")]
    Synthesis(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
