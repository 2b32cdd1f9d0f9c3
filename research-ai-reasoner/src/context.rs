//! Process-wide wiring of the research pipeline.

use crate::config::ResearchConfig;
use crate::error::ResearchError;
use crate::reasoner::{Answer, ExportedAnswer, Reasoner};
use crate::summarizer::{Summarizer, SummarizerChoice, SummarizerKind};
use anyhow::{Context, Result};
use research_ai_embed::{EmbedError, EmbeddingProvider, create_provider};
use research_ai_retriever::{BuildOutcome, IndexStatus, Retriever};
use std::sync::Arc;
use tracing::info;

/// Everything needed to answer research questions, built once at startup and
/// shared by reference.
pub struct ResearchContext {
    config: ResearchConfig,
    provider: Arc<dyn EmbeddingProvider>,
    retriever: Arc<Retriever>,
    summarizer: Arc<dyn Summarizer>,
    reasoner: Reasoner,
}

impl ResearchContext {
    /// Create the embedding provider, retriever and summarizer described by
    /// `config`. No index is built or loaded yet.
    ///
    /// # Errors
    /// Fails on invalid configuration. An embedding model that cannot be
    /// served surfaces as [`ResearchError::MissingCapability`], which callers
    /// can recover with `downcast_ref`.
    pub async fn from_config(config: ResearchConfig) -> Result<Self> {
        config.validate()?;

        let provider = create_provider(&config.embedding)
            .await
            .map_err(|e| match e {
                EmbedError::MissingCapability { capability, hint } => {
                    anyhow::Error::new(ResearchError::MissingCapability { capability, hint })
                }
                other => anyhow::Error::new(other).context("Failed to create embedding provider"),
            })?;

        let summarizer =
            SummarizerChoice::resolve(&config.summarizer).context("Failed to create summarizer")?;
        info!(
            "Research context ready: embedder {}, {:?} summarizer",
            provider.model_id(),
            summarizer.kind()
        );

        Ok(Self::with_components(config, provider, Arc::new(summarizer)))
    }

    /// [`ResearchContext::from_config`] followed by loading or building the index
    pub async fn open(config: ResearchConfig) -> Result<Self> {
        let context = Self::from_config(config).await?;
        let outcome = context.build_or_load_index(false).await?;
        info!("Index ready with {} chunks", outcome.chunks());
        Ok(context)
    }

    /// Assemble a context from already constructed capabilities
    pub fn with_components(
        config: ResearchConfig,
        provider: Arc<dyn EmbeddingProvider>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        let retriever = Arc::new(Retriever::new(
            config.retriever_config(),
            Arc::clone(&provider),
        ));
        let reasoner = Reasoner::new(Arc::clone(&retriever), Arc::clone(&summarizer));

        Self {
            config,
            provider,
            retriever,
            summarizer,
            reasoner,
        }
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    pub fn reasoner(&self) -> &Reasoner {
        &self.reasoner
    }

    pub fn summarizer_kind(&self) -> SummarizerKind {
        self.summarizer.kind()
    }

    pub async fn build_or_load_index(&self, force_rebuild: bool) -> Result<BuildOutcome, ResearchError> {
        Ok(self.retriever.build_or_load_index(force_rebuild).await?)
    }

    /// Rebuild the index from the data directory and swap it in. Queries in
    /// flight keep using the previous index.
    pub async fn rebuild(&self) -> Result<BuildOutcome, ResearchError> {
        Ok(self.retriever.rebuild().await?)
    }

    pub async fn status(&self) -> Result<IndexStatus, ResearchError> {
        Ok(self.retriever.status().await?)
    }

    /// Answer with the configured `topk_per_subquery`
    pub async fn answer(&self, query: &str) -> Result<Answer, ResearchError> {
        self.reasoner
            .answer(query, self.config.topk_per_subquery)
            .await
    }

    /// Answer and export to the configured `export_path`
    pub async fn answer_and_export(&self, query: &str) -> Result<ExportedAnswer, ResearchError> {
        self.reasoner
            .answer_and_export(query, self.config.topk_per_subquery, &self.config.export_path)
            .await
    }
}
