//! Build, persist, load and query the similarity index for a data directory.
//!
//! ## Lifecycle
//!
//! A [`Retriever`] starts without an index. [`Retriever::build_or_load_index`]
//! either loads the persisted artifacts from the index directory or runs the
//! full pipeline:
//!
//! ```text
//! data_dir → loader → ChunkingStrategy → EmbeddingProvider → FlatIndex → index_dir
//! ```
//!
//! A persisted index is only reused when it loads cleanly and was embedded with
//! the same model as the current provider; otherwise it is rebuilt.
//!
//! ## Concurrency
//!
//! The active index is an `Arc<FlatIndex>` behind a read-write lock. Queries
//! clone the `Arc` and search without holding the lock, and a rebuild prepares
//! the new index completely before swapping it in, so readers always see
//! either the old or the new snapshot.

use crate::error::{Result, RetrieverError};
use crate::retrieval::chunking_strategy::{ChunkingConfig, ChunkingStrategy};
use crate::retrieval::loader::{FileFault, load_documents, scan_data_dir};
use crate::storage::{FlatIndex, SearchHit};
use research_ai_embed::{EmbeddingProvider, l2_normalize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Configuration for a retriever
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieverConfig {
    /// Directory scanned for `.txt`, `.md` and `.pdf` documents
    pub data_dir: PathBuf,
    /// Directory holding the persisted index artifacts
    pub index_dir: PathBuf,
    pub chunking: ChunkingConfig,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            index_dir: PathBuf::from("outputs/index"),
            chunking: ChunkingConfig::default(),
        }
    }
}

impl RetrieverConfig {
    pub fn new(data_dir: impl Into<PathBuf>, index_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            index_dir: index_dir.into(),
            chunking: ChunkingConfig::default(),
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkingConfig) -> Self {
        self.chunking = chunking;
        self
    }
}

/// What [`Retriever::build_or_load_index`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// A valid persisted index was loaded
    Loaded { chunks: usize },
    /// A fresh index was built and persisted
    Built {
        chunks: usize,
        documents: usize,
        faults: Vec<FileFault>,
    },
    /// No text was found; the active index is empty and nothing is persisted
    Empty { faults: Vec<FileFault> },
}

impl BuildOutcome {
    /// Number of chunks in the active index
    pub fn chunks(&self) -> usize {
        match self {
            Self::Loaded { chunks } | Self::Built { chunks, .. } => *chunks,
            Self::Empty { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    NotReady,
    Ready {
        chunks: usize,
        sources: usize,
        model_id: String,
        dimension: usize,
    },
}

/// Snapshot of the retriever for status reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStatus {
    pub state: IndexState,
    pub data_dir: PathBuf,
    /// Supported files currently present in the data directory
    pub supported_files: usize,
}

impl IndexStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self.state, IndexState::Ready { .. })
    }
}

pub struct Retriever {
    config: RetrieverConfig,
    provider: Arc<dyn EmbeddingProvider>,
    index: RwLock<Option<Arc<FlatIndex>>>,
    /// Serializes builds so two rebuilds never write the artifacts at once
    build_lock: Mutex<()>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("config", &self.config)
            .field("model_id", &self.provider.model_id())
            .finish()
    }
}

impl Retriever {
    /// Create a retriever with no index. Nothing is read until
    /// [`Retriever::build_or_load_index`] is called.
    pub fn new(config: RetrieverConfig, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            config,
            provider,
            index: RwLock::new(None),
            build_lock: Mutex::new(()),
        }
    }

    /// Create a retriever around an index that is already in memory
    pub fn from_index(
        config: RetrieverConfig,
        provider: Arc<dyn EmbeddingProvider>,
        index: FlatIndex,
    ) -> Self {
        Self {
            config,
            provider,
            index: RwLock::new(Some(Arc::new(index))),
            build_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// The active index snapshot, if any
    pub async fn current_index(&self) -> Option<Arc<FlatIndex>> {
        self.index.read().await.clone()
    }

    async fn swap(&self, index: FlatIndex) {
        let mut guard = self.index.write().await;
        *guard = Some(Arc::new(index));
        debug!("Swapped in new index snapshot");
    }

    /// Make an index available for queries.
    ///
    /// Unless `force_rebuild` is set, a persisted index that loads cleanly,
    /// matches the provider's model and the configured chunking is reused. A
    /// persisted index that fails any of these checks is logged and rebuilt.
    ///
    /// # Errors
    /// Fails on an invalid chunking configuration, when the data directory
    /// cannot be listed, when embedding fails, or when the new artifacts cannot
    /// be written. The previously active index stays in place on failure.
    pub async fn build_or_load_index(&self, force_rebuild: bool) -> Result<BuildOutcome> {
        let _build = self.build_lock.lock().await;
        let strategy = ChunkingStrategy::new(self.config.chunking)?;
        let index_dir = &self.config.index_dir;

        if !force_rebuild && FlatIndex::has_artifacts(index_dir).await {
            match self.load_persisted().await {
                Ok(index) => {
                    let chunks = index.len();
                    self.swap(index).await;
                    return Ok(BuildOutcome::Loaded { chunks });
                }
                Err(e) => warn!(
                    "Persisted index in {} is unusable, rebuilding: {}",
                    index_dir.display(),
                    e
                ),
            }
        }

        self.build_fresh(&strategy).await
    }

    /// Force a rebuild from the data directory
    pub async fn rebuild(&self) -> Result<BuildOutcome> {
        self.build_or_load_index(true).await
    }

    async fn load_persisted(&self) -> Result<FlatIndex> {
        let index = FlatIndex::load(&self.config.index_dir).await?;

        let query_model = self.provider.model_id();
        if index.model_id() != query_model {
            return Err(RetrieverError::ModelMismatch {
                index_model: index.model_id().to_string(),
                query_model,
            });
        }

        let persisted = index.chunking();
        let configured = self.config.chunking;
        if persisted != configured {
            return Err(RetrieverError::corrupt(
                &self.config.index_dir,
                format!(
                    "built with chunk_size {} overlap {} max_chunks {}, configured {} {} {}",
                    persisted.chunk_size,
                    persisted.overlap,
                    persisted.max_chunks,
                    configured.chunk_size,
                    configured.overlap,
                    configured.max_chunks
                ),
            ));
        }

        Ok(index)
    }

    async fn build_fresh(&self, strategy: &ChunkingStrategy) -> Result<BuildOutcome> {
        let report = load_documents(&self.config.data_dir).await?;
        let chunks = strategy.chunk_documents(&report.documents);

        if chunks.is_empty() {
            warn!(
                "No text found in {}; add .txt, .md or .pdf documents and rebuild",
                self.config.data_dir.display()
            );
            FlatIndex::remove_artifacts(&self.config.index_dir).await?;
            self.swap(FlatIndex::empty(
                self.provider.model_id(),
                self.provider.embedding_dimension(),
                self.config.chunking,
            ))
            .await;
            return Ok(BuildOutcome::Empty {
                faults: report.faults,
            });
        }

        info!(
            "Encoding {} chunks with model {}",
            chunks.len(),
            self.provider.model_id()
        );
        let index = FlatIndex::build(&chunks, self.provider.as_ref(), self.config.chunking).await?;
        index.save(&self.config.index_dir).await?;

        let outcome = BuildOutcome::Built {
            chunks: index.len(),
            documents: report.documents.len(),
            faults: report.faults,
        };
        self.swap(index).await;
        Ok(outcome)
    }

    /// Return the `top_k` chunks most similar to `text`, best first.
    ///
    /// # Errors
    /// - [`RetrieverError::EmptyQuery`] for blank text
    /// - [`RetrieverError::InvalidTopK`] when `top_k` is 0
    /// - [`RetrieverError::IndexNotReady`] before any build or load
    /// - [`RetrieverError::IndexEmpty`] when the index holds no chunks
    /// - [`RetrieverError::ModelMismatch`] when the index was embedded with a
    ///   different model than the provider
    pub async fn query(&self, text: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        if text.trim().is_empty() {
            return Err(RetrieverError::EmptyQuery);
        }
        if top_k == 0 {
            return Err(RetrieverError::InvalidTopK);
        }

        let index = self
            .current_index()
            .await
            .ok_or(RetrieverError::IndexNotReady)?;
        if index.is_empty() {
            return Err(RetrieverError::IndexEmpty);
        }

        let query_model = self.provider.model_id();
        if index.model_id() != query_model {
            return Err(RetrieverError::ModelMismatch {
                index_model: index.model_id().to_string(),
                query_model,
            });
        }

        let mut vector = self.provider.embed_text(text).await?;
        l2_normalize(&mut vector);
        let hits = index.search(&vector, top_k)?;

        debug!("Query returned {} hits (top_k {})", hits.len(), top_k);
        Ok(hits)
    }

    /// Report whether an index is active and what the data directory holds
    pub async fn status(&self) -> Result<IndexStatus> {
        let supported_files = scan_data_dir(&self.config.data_dir).await?.len();
        let state = match self.current_index().await {
            None => IndexState::NotReady,
            Some(index) => IndexState::Ready {
                chunks: index.len(),
                sources: index.source_count(),
                model_id: index.model_id().to_string(),
                dimension: index.dimension(),
            },
        };

        Ok(IndexStatus {
            state,
            data_dir: self.config.data_dir.clone(),
            supported_files,
        })
    }
}
