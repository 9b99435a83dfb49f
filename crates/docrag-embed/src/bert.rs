use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use candle_core::{Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::Tokenizer;

use docrag_core::traits::Embedder;
use docrag_core::{Error, Result as CoreResult};

use crate::device::select_device;
use crate::pool::masked_mean_l2;
use crate::tokenize::tokenize_on_device;

/// Sentence encoder over a BERT checkpoint (all-MiniLM-L6-v2 and friends).
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    dim: usize,
    max_len: usize,
    id: String,
}

impl BertEmbedder {
    /// Load `config.json`, `tokenizer.json` and weights from `model_dir`.
    ///
    /// Weights are read from `model.safetensors`, falling back to
    /// `pytorch_model.bin`. Any failure maps to `ModelUnavailable`.
    pub fn load(model_dir: &Path, max_len: usize) -> CoreResult<Self> {
        Self::load_inner(model_dir, max_len)
            .map_err(|e| Error::ModelUnavailable(format!("{}: {:#}", model_dir.display(), e)))
    }

    fn load_inner(model_dir: &Path, max_len: usize) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(anyhow!("model directory does not exist"));
        }
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading sentence embedding model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)
        })?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let dim = serde_json::from_str::<serde_json::Value>(&raw)?
            .get("hidden_size")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| anyhow!("config.json has no hidden_size"))? as usize;

        let safetensors = model_dir.join("model.safetensors");
        let vb = if safetensors.exists() {
            // SAFETY: the weights file is not modified while mapped.
            unsafe { VarBuilder::from_mmaped_safetensors(&[&safetensors], DTYPE, &device)? }
        } else {
            let weights_path = model_dir.join("pytorch_model.bin");
            let weights = candle_core::pickle::read_all(&weights_path)
                .with_context(|| format!("reading {}", weights_path.display()))?;
            let weights_map: HashMap<String, Tensor> = weights.into_iter().collect();
            VarBuilder::from_tensors(weights_map, DTYPE, &device)
        };
        let model = BertModel::load(vb, &config)?;

        let name = model_dir.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");
        let id = format!("bert:{}:d{}", name, dim);
        tracing::info!(model = %id, "sentence embedding model loaded");
        Ok(Self { model, tokenizer, device, dim, max_len, id })
    }

    fn embed_inner(&self, text: &str) -> Result<Vec<f32>> {
        let start = Instant::now();
        let (input_ids, attention_mask) =
            tokenize_on_device(&self.tokenizer, text, self.max_len, &self.device)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self.model.forward(&input_ids, &token_type_ids, Some(&attention_mask))?;
        let pooled = masked_mean_l2(&hidden, &attention_mask)?;
        let emb = pooled.to_device(&Device::Cpu)?.squeeze(0)?.to_vec1::<f32>()?;
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 250 {
            tracing::debug!(?elapsed, chars = text.len(), "slow embedding");
        }
        Ok(emb)
    }
}

impl Embedder for BertEmbedder {
    fn model_id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed(&self, text: &str) -> CoreResult<Vec<f32>> {
        let v = self.embed_inner(text).map_err(|e| Error::Embedding(format!("{:#}", e)))?;
        if v.len() != self.dim {
            return Err(Error::DimensionMismatch { expected: self.dim, got: v.len() });
        }
        Ok(v)
    }
}
