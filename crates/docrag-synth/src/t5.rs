use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5::{Config as T5Config, T5ForConditionalGeneration};
use parking_lot::Mutex;
use tokenizers::Tokenizer;

use docrag_core::{Error, Result as CoreResult};
use docrag_embed::device::select_device;

use crate::generator::TextGenerator;

/// Greedy-decoding T5 encoder-decoder (flan-t5-small and friends).
///
/// The model keeps a KV cache between decode steps, so calls are serialised
/// through a mutex and the cache is cleared around every generation.
pub struct T5Generator {
    model: Mutex<T5ForConditionalGeneration>,
    tokenizer: Tokenizer,
    config: T5Config,
    device: Device,
    max_new_tokens: usize,
    max_input_tokens: usize,
}

impl T5Generator {
    pub fn load(
        model_dir: &Path,
        max_new_tokens: usize,
        max_input_tokens: usize,
    ) -> CoreResult<Self> {
        Self::load_inner(model_dir, max_new_tokens, max_input_tokens)
            .map_err(|e| Error::SynthesisUnavailable(format!("{}: {:#}", model_dir.display(), e)))
    }

    fn load_inner(
        model_dir: &Path,
        max_new_tokens: usize,
        max_input_tokens: usize,
    ) -> Result<Self> {
        if !model_dir.is_dir() {
            return Err(anyhow!("model directory does not exist"));
        }
        let device = select_device();
        tracing::info!(dir = %model_dir.display(), "loading text generation model");

        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            anyhow!("Failed to load tokenizer from {}: {}", tokenizer_path.display(), e)
        })?;

        let config_path = model_dir.join("config.json");
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: T5Config = serde_json::from_str(&raw)?;

        let weights_path = model_dir.join("model.safetensors");
        if !weights_path.exists() {
            return Err(anyhow!("{} not found", weights_path.display()));
        }
        // SAFETY: the weights file is not modified while mapped.
        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[&weights_path], DType::F32, &device)? };
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        tracing::info!("text generation model loaded");
        Ok(Self {
            model: Mutex::new(model),
            tokenizer,
            config,
            device,
            max_new_tokens,
            max_input_tokens,
        })
    }

    fn generate_inner(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let enc = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;
        let mut ids = enc.get_ids().to_vec();
        if ids.len() > self.max_input_tokens {
            ids.truncate(self.max_input_tokens);
        }
        let input_ids = Tensor::new(ids.as_slice(), &self.device)?.unsqueeze(0)?;

        let mut model = self.model.lock();
        model.clear_kv_cache();
        let encoder_output = model.encode(&input_ids)?;

        let start_token =
            self.config.decoder_start_token_id.unwrap_or(self.config.pad_token_id) as u32;
        let mut output = vec![start_token];
        let mut logits_processor = LogitsProcessor::new(0, None, None);
        for step in 0..self.max_new_tokens {
            let decoder_ids = if step == 0 || !self.config.use_cache {
                Tensor::new(output.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = output[output.len() - 1];
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };
            let logits = model.decode(&decoder_ids, &encoder_output)?.squeeze(0)?;
            let next = logits_processor.sample(&logits)?;
            if next as usize == self.config.eos_token_id {
                break;
            }
            output.push(next);
        }
        model.clear_kv_cache();
        drop(model);

        let text = self
            .tokenizer
            .decode(&output[1..], true)
            .map_err(|e| anyhow!("Detokenization failed: {}", e))?;
        tracing::debug!(
            elapsed = ?start.elapsed(),
            new_tokens = output.len() - 1,
            "generation finished"
        );
        Ok(text)
    }
}

impl TextGenerator for T5Generator {
    fn generate(&self, prompt: &str) -> CoreResult<String> {
        self.generate_inner(prompt).map_err(|e| Error::Synthesis(format!("{:#}", e)))
    }

    fn count_tokens(&self, text: &str) -> usize {
        self.tokenizer
            .encode(text, true)
            .map(|enc| enc.get_ids().len())
            .unwrap_or_else(|_| text.split_whitespace().count())
    }

    fn max_input_tokens(&self) -> usize {
        self.max_input_tokens
    }
}
