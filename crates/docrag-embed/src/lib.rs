//! Embedding provider: a candle BERT sentence encoder plus a deterministic
//! hashing embedder for offline development.
//!
//! Respects `APP_USE_FAKE_EMBEDDINGS=1` to force the hashing embedder.

use std::sync::Arc;

use docrag_core::config::EmbeddingSettings;
use docrag_core::traits::Embedder;
use docrag_core::Result;

pub mod bert;
pub mod device;
pub mod hashing;
pub mod pool;
pub mod tokenize;

pub use bert::BertEmbedder;
pub use hashing::HashingEmbedder;
pub use pool::masked_mean_l2;

fn fake_forced_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the embedder selected by `settings`.
pub fn load_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    if settings.use_fake || fake_forced_by_env() {
        tracing::info!(dim = settings.fake_dim, "using hashing embedder");
        return Ok(Arc::new(HashingEmbedder::new(settings.fake_dim)));
    }
    Ok(Arc::new(BertEmbedder::load(&settings.model_dir, settings.max_len)?))
}
