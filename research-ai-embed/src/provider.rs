//! Embedding provider implementations

use crate::config::{EmbedConfig, ModelFamily};
use crate::error::{EmbedError, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use fnv::FnvHasher;
use std::hash::Hasher;
use std::sync::{Arc, Mutex};

/// Model names the fastembed backend can serve, with their backend identifiers.
const FASTEMBED_MODELS: &[(&str, EmbeddingModel)] = &[
    ("all-MiniLM-L6-v2", EmbeddingModel::AllMiniLML6V2),
    ("all-MiniLM-L12-v2", EmbeddingModel::AllMiniLML12V2),
    ("bge-small-en-v1.5", EmbeddingModel::BGESmallENV15),
];

/// Result of embedding generation
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// The generated embeddings, one per input text
    pub embeddings: Vec<Vec<f32>>,
    /// The dimension of each embedding vector
    pub dimension: usize,
}

impl EmbeddingResult {
    /// Create a new embedding result.
    ///
    /// The dimension is inferred from the first embedding vector and defaults to
    /// 0 for an empty result.
    pub fn new(embeddings: Vec<Vec<f32>>) -> Self {
        let dimension = embeddings.first().map(|e| e.len()).unwrap_or(0);
        Self {
            embeddings,
            dimension,
        }
    }

    /// Returns the number of embedding vectors in this result.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if this result contains no embedding vectors.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }
}

/// Scale `vector` to unit L2 norm in place and return the original norm.
///
/// Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) -> f32 {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    norm
}

/// Trait for embedding providers that can generate embeddings from text
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embeddings for a single text
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let texts = vec![text.to_string()];
        let result = self.embed_texts(&texts).await?;
        result
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::invalid_config("No embedding generated for text"))
    }

    /// Generate embeddings for multiple texts (batch processing)
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult>;

    /// Get the dimension of embeddings produced by this provider
    fn embedding_dimension(&self) -> usize;

    /// Get the name/identifier of this provider
    fn provider_name(&self) -> &str;

    /// Get the name of the model behind this provider
    fn model_name(&self) -> &str;

    /// Identity of the embedding space; vectors are only comparable when these match
    fn model_id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.provider_name(),
            self.model_name(),
            self.embedding_dimension()
        )
    }
}

/// Build the provider selected by `config`.
///
/// Model names starting with `hashing-` select [`HashingEmbedProvider`], every
/// other name is resolved against the fastembed model table.
///
/// # Errors
/// [`EmbedError::MissingCapability`] when the model is unknown or its backend
/// cannot be initialized.
pub async fn create_provider(config: &EmbedConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.family()? {
        ModelFamily::Hashing { dimension } => {
            tracing::info!("Using hashing embedder with dimension {}", dimension);
            Ok(Arc::new(HashingEmbedProvider::new(dimension)?))
        }
        ModelFamily::FastEmbed => Ok(Arc::new(FastEmbedProvider::create(config.clone()).await?)),
    }
}

/// FastEmbed-based embedding provider using local ONNX models
#[derive(Clone)]
pub struct FastEmbedProvider {
    config: EmbedConfig,
    model: Arc<Mutex<TextEmbedding>>,
    dimension: usize,
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("config", &self.config)
            .field("dimension", &self.dimension)
            .finish()
    }
}

impl FastEmbedProvider {
    /// Names of the models this backend can serve
    pub fn supported_models() -> Vec<&'static str> {
        FASTEMBED_MODELS.iter().map(|(name, _)| *name).collect()
    }

    fn resolve_model(model_name: &str) -> Result<EmbeddingModel> {
        FASTEMBED_MODELS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(model_name))
            .map(|(_, model)| model.clone())
            .ok_or_else(|| {
                EmbedError::missing_capability(
                    format!("embedding model '{model_name}'"),
                    format!(
                        "configure one of: {}, or hashing-<dimension> for the offline embedder",
                        Self::supported_models().join(", ")
                    ),
                )
            })
    }

    /// Loads the ONNX model and probes its output dimension.
    pub async fn create(config: EmbedConfig) -> Result<Self> {
        tracing::info!(
            "Initializing FastEmbed provider for model: {}",
            config.model_name()
        );

        let model = Self::resolve_model(config.model_name())?;
        if let Some(cache_dir) = &config.cache_dir {
            tokio::fs::create_dir_all(cache_dir).await?;
        }

        // Load model in a blocking task
        let load_config = config.clone();
        let (model, dimension) =
            tokio::task::spawn_blocking(move || -> Result<(TextEmbedding, usize)> {
                let mut options = InitOptions::new(model)
                    .with_show_download_progress(load_config.show_download_progress);
                if let Some(cache_dir) = load_config.cache_dir.clone() {
                    options = options.with_cache_dir(cache_dir);
                }

                let mut model = TextEmbedding::try_new(options).map_err(|e| {
                    EmbedError::missing_capability(
                        format!("embedding model '{}'", load_config.model_name()),
                        format!("the ONNX backend failed to load it ({e}); check network access and cache_dir"),
                    )
                })?;

                // Get dimension by generating a probe embedding
                let probe = model.embed(vec!["dimension probe".to_string()], None)?;
                let dimension = probe
                    .first()
                    .map(|emb| emb.len())
                    .filter(|len| *len > 0)
                    .ok_or_else(|| EmbedError::invalid_config("model produced an empty embedding"))?;

                tracing::info!("Model loaded successfully. Dimension: {}", dimension);
                Ok((model, dimension))
            })
            .await??;

        Ok(Self {
            config,
            model: Arc::new(Mutex::new(model)),
            dimension,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        if texts.is_empty() {
            return Ok(EmbeddingResult::new(vec![]));
        }

        tracing::debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size) {
            let chunk = chunk.to_vec();
            let model = Arc::clone(&self.model);

            let batch_embeddings = tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
                tracing::debug!("Processing batch of {} texts", chunk.len());

                let mut model_guard = model
                    .lock()
                    .map_err(|_| EmbedError::generation("embedding model lock poisoned"))?;
                model_guard
                    .embed(chunk, None)
                    .map_err(|e| EmbedError::generation(e.to_string()))
            })
            .await??;

            for embedding in &batch_embeddings {
                if embedding.len() != self.dimension {
                    return Err(EmbedError::DimensionMismatch {
                        expected: self.dimension,
                        actual: embedding.len(),
                    });
                }
            }
            all_embeddings.extend(batch_embeddings);
        }

        tracing::debug!("Generated {} embeddings", all_embeddings.len());
        Ok(EmbeddingResult::new(all_embeddings))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "fastembed"
    }

    fn model_name(&self) -> &str {
        self.config.model_name()
    }
}

/// Offline embedder that hashes lower-cased word tokens into a fixed number of
/// signed buckets (the "hashing trick") and normalizes the result.
///
/// Texts sharing vocabulary land close together, which is enough for lexical
/// retrieval without any model files. Output is deterministic across runs and
/// platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedProvider {
    dimension: usize,
    model_name: String,
}

impl HashingEmbedProvider {
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(EmbedError::invalid_config(
                "hashing embedder dimension must be positive",
            ));
        }
        Ok(Self {
            dimension,
            model_name: format!("{}{dimension}", crate::config::HASHING_MODEL_PREFIX),
        })
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hasher = FnvHasher::default();
            hasher.write(token.to_lowercase().as_bytes());
            let hash = hasher.finish();

            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedProvider {
    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        let embeddings: Vec<Vec<f32>> = texts.iter().map(|t| self.embed_one(t)).collect();
        Ok(EmbeddingResult {
            embeddings,
            dimension: self.dimension,
        })
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "hashing"
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
