//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_INDEX__DIR`). Provides helpers to
//! expand `~` and `${VAR}` and to resolve relative paths against a known base
//! directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment (tests, embedding callers).
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings tree.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if matches!(env, "prod" | "production") {
            // Fake models answer nonsense; never let them reach production.
            let fake_embed: bool = self.get("embedding.use_fake").unwrap_or(false);
            let fake_synth: bool = self.get("synthesis.use_fake").unwrap_or(false);
            if fake_embed || fake_synth {
                let msg = "fake models are not allowed in production";
                return Err(Error::InvalidConfig(msg.into()).into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub embedding: EmbeddingSettings,
    pub index: IndexSettings,
    pub synthesis: SynthesisSettings,
    pub reindex: ReindexSettings,
    pub recovery: RecoverySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub top_k: usize,
    pub synthesis_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self { top_k: 3, synthesis_timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model_dir: PathBuf,
    pub max_len: usize,
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            max_len: 256,
            use_fake: false,
            fake_dim: 384,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub dir: PathBuf,
    pub table: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self { dir: PathBuf::from("data/vector_index"), table: "passages".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisSettings {
    pub model_dir: PathBuf,
    pub max_new_tokens: usize,
    pub max_input_tokens: usize,
    pub use_fake: bool,
}

impl Default for SynthesisSettings {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models/flan-t5-small"),
            max_new_tokens: 256,
            max_input_tokens: 512,
            use_fake: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReindexSettings {
    pub on_startup: bool,
    pub clear_before_rebuild: bool,
    pub documents_dir: PathBuf,
}

impl Default for ReindexSettings {
    fn default() -> Self {
        Self {
            on_startup: false,
            clear_before_rebuild: true,
            documents_dir: PathBuf::from("data/documents"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoverySettings {
    pub enabled: bool,
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self { enabled: false, initial_backoff_secs: 5, max_backoff_secs: 300 }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::Result<()> {
        if self.engine.top_k == 0 {
            return Err(Error::InvalidConfig("engine.top_k must be at least 1".into()));
        }
        if self.synthesis.max_input_tokens == 0 {
            return Err(Error::InvalidConfig(
                "synthesis.max_input_tokens must be at least 1".into(),
            ));
        }
        if self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be at least 1".into()));
        }
        if self.index.table.trim().is_empty() {
            return Err(Error::InvalidConfig("index.table must not be empty".into()));
        }
        if self.recovery.initial_backoff_secs > self.recovery.max_backoff_secs {
            return Err(Error::InvalidConfig(
                "recovery.initial_backoff_secs exceeds max_backoff_secs".into(),
            ));
        }
        Ok(())
    }

    /// Expand and anchor every configured path at `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        let resolve = |p: &Path| resolve_with_base(base, p.to_string_lossy());
        self.embedding.model_dir = resolve(&self.embedding.model_dir);
        self.index.dir = resolve(&self.index.dir);
        self.synthesis.model_dir = resolve(&self.synthesis.model_dir);
        self.reindex.documents_dir = resolve(&self.reindex.documents_dir);
        self
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
