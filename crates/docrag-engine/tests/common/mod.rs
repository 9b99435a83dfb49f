#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use docrag_core::config::Settings;
use docrag_core::traits::{Embedder, Synthesizer, VectorIndex};
use docrag_core::{Error, Result};
use docrag_embed::HashingEmbedder;
use docrag_engine::{ComponentFactory, RagEngine};
use docrag_synth::ExtractiveSynthesizer;
use docrag_vector::LanceVectorIndex;

pub const DIM: usize = 384;
pub const TABLE: &str = "passages";

/// Factory over the hashing embedder, a LanceDB index in `index_dir` and the
/// extractive synthesizer, with switches for injecting load failures.
pub struct StubFactory {
    pub index_dir: PathBuf,
    pub embedder: Arc<dyn Embedder>,
    pub synthesizer: Arc<dyn Synthesizer>,
    /// The next this-many embedder loads fail.
    pub embedder_failures: AtomicUsize,
    pub fail_index: bool,
    pub fail_synthesizer: bool,
}

impl StubFactory {
    pub fn new(index_dir: &Path) -> Self {
        Self {
            index_dir: index_dir.to_path_buf(),
            embedder: Arc::new(HashingEmbedder::new(DIM)),
            synthesizer: Arc::new(ExtractiveSynthesizer),
            embedder_failures: AtomicUsize::new(0),
            fail_index: false,
            fail_synthesizer: false,
        }
    }

    pub fn failing_embedder_loads(self, times: usize) -> Self {
        self.embedder_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = synthesizer;
        self
    }
}

#[async_trait]
impl ComponentFactory for StubFactory {
    async fn embedder(&self) -> Result<Arc<dyn Embedder>> {
        let remaining = self.embedder_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.embedder_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::ModelUnavailable("stub embedder refused to load".into()));
        }
        Ok(Arc::clone(&self.embedder))
    }

    async fn index(&self, dim: usize) -> Result<Arc<dyn VectorIndex>> {
        if self.fail_index {
            return Err(Error::IndexUnavailable("stub index refused to open".into()));
        }
        Ok(Arc::new(LanceVectorIndex::open(&self.index_dir, TABLE, dim).await?))
    }

    async fn synthesizer(&self) -> Result<Arc<dyn Synthesizer>> {
        if self.fail_synthesizer {
            return Err(Error::SynthesisUnavailable("stub synthesizer refused to load".into()));
        }
        Ok(Arc::clone(&self.synthesizer))
    }
}

/// Embedder that loads fine but fails every call.
pub struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn model_id(&self) -> &str {
        "broken"
    }
    fn dim(&self) -> usize {
        DIM
    }
    fn max_len(&self) -> usize {
        0
    }
    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(Error::Embedding("tokenizer exploded".into()))
    }
}

/// Synthesizer that takes longer than any reasonable timeout.
pub struct SlowSynthesizer(pub Duration);

impl Synthesizer for SlowSynthesizer {
    fn synthesize(&self, _question: &str, _passages: &[String]) -> Result<String> {
        std::thread::sleep(self.0);
        Ok("too late".into())
    }
}

pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.embedding.use_fake = true;
    settings.synthesis.use_fake = true;
    settings
}

pub async fn engine_with(settings: &Settings, factory: StubFactory) -> RagEngine {
    RagEngine::initialize(settings, Arc::new(factory)).await
}

/// Row count seen by a fresh handle on the same index directory.
pub async fn stored_count(index_dir: &Path) -> usize {
    let index = LanceVectorIndex::open(index_dir, TABLE, DIM).await.unwrap();
    index.count().await.unwrap()
}
