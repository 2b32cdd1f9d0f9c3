//! Configuration for embedding models

use crate::error::{EmbedError, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default model used when nothing else is configured.
pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Prefix selecting the built-in feature hashing embedder, e.g. `hashing-384`.
pub const HASHING_MODEL_PREFIX: &str = "hashing-";

/// Which backend a model name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFamily {
    /// Local ONNX model run through fastembed
    FastEmbed,
    /// Deterministic token hashing with the given dimension
    Hashing { dimension: usize },
}

/// Configuration for embedding models
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct EmbedConfig {
    /// Name of the embedding model to use
    pub model_name: String,
    /// Directory where the backend keeps downloaded model files
    #[builder(default)]
    pub cache_dir: Option<PathBuf>,
    /// Maximum batch size for embedding generation
    #[builder(default = "32")]
    pub batch_size: usize,
    /// Whether the backend should report download progress
    #[builder(default = "false")]
    pub show_download_progress: bool,
}

impl EmbedConfig {
    /// Create a new embedding configuration using the builder
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder::default()
    }

    /// Create a new embedding configuration for `model_name` with defaults
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }

    /// Configuration for the offline hashing embedder
    pub fn hashing(dimension: usize) -> Self {
        Self::new(format!("{HASHING_MODEL_PREFIX}{dimension}"))
    }

    /// Set the batch size for embedding generation (builder style)
    pub fn with_batch_size(self, batch_size: usize) -> Self {
        Self { batch_size, ..self }
    }

    /// Set the model cache directory (builder style)
    pub fn with_cache_dir(self, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: Some(cache_dir.into()),
            ..self
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Resolve the backend family from the model name
    pub fn family(&self) -> Result<ModelFamily> {
        match self.model_name.strip_prefix(HASHING_MODEL_PREFIX) {
            Some(dimension) => {
                let dimension: usize = dimension.parse().map_err(|_| {
                    EmbedError::invalid_config(format!(
                        "invalid hashing model name '{}': expected {HASHING_MODEL_PREFIX}<dimension>",
                        self.model_name
                    ))
                })?;
                if dimension == 0 {
                    return Err(EmbedError::invalid_config(
                        "hashing embedder dimension must be positive",
                    ));
                }
                Ok(ModelFamily::Hashing { dimension })
            }
            None => Ok(ModelFamily::FastEmbed),
        }
    }

    /// Validate the configuration without touching any backend
    pub fn validate(&self) -> Result<()> {
        if self.model_name.trim().is_empty() {
            return Err(EmbedError::invalid_config("model_name must not be empty"));
        }
        if self.batch_size == 0 {
            return Err(EmbedError::invalid_config("batch_size must be positive"));
        }
        self.family()?;

        tracing::debug!("Embedding configuration valid for: {}", self.model_name);
        Ok(())
    }
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            cache_dir: None,
            batch_size: 32,
            show_download_progress: false,
        }
    }
}
