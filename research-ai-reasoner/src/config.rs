//! Application configuration, loaded from TOML.
//!
//! ```toml
//! data_dir = "data"
//! index_dir = "outputs/index"
//! export_path = "outputs/result.md"
//! topk_per_subquery = 3
//!
//! [embedding]
//! model_name = "all-MiniLM-L6-v2"
//!
//! [chunking]
//! chunk_size = 500
//! overlap = 50
//!
//! [summarizer]
//! endpoint = "https://api-inference.huggingface.co/models/sshleifer/distilbart-cnn-12-6"
//! ```
//!
//! Every key is optional; missing keys take the values of
//! [`ResearchConfig::local`].

use anyhow::{Context, Result, bail};
use research_ai_embed::EmbedConfig;
use research_ai_retriever::{ChunkingConfig, RetrieverConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable whose presence selects the constrained profile
pub const CONSTRAINED_ENV: &str = "RENDER";

/// Settings for the summarization step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// Inference endpoint of a hosted summarization model. Without one the
    /// naive extractive summarizer is used.
    pub endpoint: Option<String>,
    /// Environment variable holding the bearer token for `endpoint`
    pub api_token_env: String,
    /// Texts with fewer words are returned unchanged
    pub min_words: usize,
    pub max_length: usize,
    pub min_length: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_token_env: "HF_API_TOKEN".to_string(),
            min_words: 50,
            max_length: 200,
            min_length: 30,
        }
    }
}

impl SummarizerConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResearchConfig {
    pub data_dir: PathBuf,
    pub index_dir: PathBuf,
    /// Where `answer_and_export` writes its markdown report
    pub export_path: PathBuf,
    pub topk_per_subquery: usize,
    pub embedding: EmbedConfig,
    pub chunking: ChunkingConfig,
    pub summarizer: SummarizerConfig,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self::local()
    }
}

impl ResearchConfig {
    /// Profile for development machines and paid hosting
    pub fn local() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("outputs/index"),
            export_path: PathBuf::from("outputs/result.md"),
            topk_per_subquery: 3,
            embedding: EmbedConfig::new("all-MiniLM-L6-v2"),
            chunking: ChunkingConfig::new(500, 50),
            summarizer: SummarizerConfig::default(),
        }
    }

    /// Profile for memory-constrained hosts: a smaller model and shorter chunks
    pub fn constrained() -> Self {
        Self {
            embedding: EmbedConfig::new("all-MiniLM-L12-v2"),
            chunking: ChunkingConfig::new(300, 50),
            ..Self::local()
        }
    }

    /// Pick the profile for the current environment
    pub fn detect() -> Self {
        if std::env::var_os(CONSTRAINED_ENV).is_some() {
            tracing::info!("{} is set, using the constrained profile", CONSTRAINED_ENV);
            Self::constrained()
        } else {
            Self::local()
        }
    }

    /// Read a TOML file over the defaults and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.topk_per_subquery == 0 {
            bail!("topk_per_subquery must be at least 1");
        }
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be at least 1");
        }
        if self.chunking.overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.overlap,
                self.chunking.chunk_size
            );
        }
        if self.summarizer.min_length > self.summarizer.max_length {
            bail!("summarizer.min_length must not exceed summarizer.max_length");
        }
        self.embedding.validate()?;
        Ok(())
    }

    pub fn retriever_config(&self) -> RetrieverConfig {
        RetrieverConfig::new(&self.data_dir, &self.index_dir).with_chunking(self.chunking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_profiles() {
        let local = ResearchConfig::local();
        assert_eq!(local.embedding.model_name, "all-MiniLM-L6-v2");
        assert_eq!(local.chunking.chunk_size, 500);
        assert_eq!(local.chunking.max_chunks, 0);
        assert_eq!(local.topk_per_subquery, 3);
        assert_eq!(local.export_path, PathBuf::from("outputs/result.md"));

        let constrained = ResearchConfig::constrained();
        assert_eq!(constrained.embedding.model_name, "all-MiniLM-L12-v2");
        assert_eq!(constrained.chunking.chunk_size, 300);
        assert_eq!(constrained.chunking.max_chunks, 0);
        assert_eq!(constrained.data_dir, local.data_dir);
    }

    #[test]
    fn test_load_partial_toml() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("research.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "docs"
topk_per_subquery = 5

[embedding]
model_name = "hashing-128"

[summarizer]
endpoint = "http://localhost:9000/summarize"
"#,
        )?;

        let config = ResearchConfig::load(&path)?;
        assert_eq!(config.data_dir, PathBuf::from("docs"));
        assert_eq!(config.index_dir, PathBuf::from("outputs/index"));
        assert_eq!(config.topk_per_subquery, 5);
        assert_eq!(config.embedding.model_name, "hashing-128");
        assert_eq!(config.embedding.batch_size, 32);
        assert_eq!(config.chunking, ResearchConfig::local().chunking);
        assert_eq!(
            config.summarizer.endpoint.as_deref(),
            Some("http://localhost:9000/summarize")
        );
        assert_eq!(config.summarizer.min_words, 50);
        Ok(())
    }

    #[test]
    fn test_load_rejects_invalid_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 10\noverlap = 10\n")?;

        let err = ResearchConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("overlap"));

        assert!(ResearchConfig::load(&dir.path().join("missing.toml")).is_err());
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(ResearchConfig::local().validate().is_ok());
        assert!(ResearchConfig::constrained().validate().is_ok());

        let mut config = ResearchConfig::local();
        config.topk_per_subquery = 0;
        assert!(config.validate().is_err());

        let mut config = ResearchConfig::local();
        config.embedding.model_name = "hashing-0".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retriever_config() {
        let config = ResearchConfig::constrained();
        let retriever = config.retriever_config();
        assert_eq!(retriever.data_dir, PathBuf::from("data"));
        assert_eq!(retriever.index_dir, PathBuf::from("outputs/index"));
        assert_eq!(retriever.chunking.chunk_size, 300);
    }
}
