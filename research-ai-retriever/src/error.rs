//! Error types for index building and querying

use research_ai_context::ChunkError;
use research_ai_embed::EmbedError;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, RetrieverError>;

#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// Query issued before any index was built or loaded
    #[error("index not ready: build or load the index first")]
    IndexNotReady,

    /// The index exists but holds no chunks
    #[error("index is empty: no text was found in the data directory")]
    IndexEmpty,

    #[error("index artifact {} is corrupt: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    /// Vectors from different embedding spaces cannot be compared
    #[error(
        "index was built with '{index_model}' but queries are embedded with '{query_model}'; rebuild the index"
    )]
    ModelMismatch {
        index_model: String,
        query_model: String,
    },

    /// Every chunk needs exactly one vector
    #[error("got {vectors} vectors for {chunks} chunks")]
    VectorCountMismatch { vectors: usize, chunks: usize },

    #[error("query text is empty")]
    EmptyQuery,

    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error(transparent)]
    Embedding(#[from] EmbedError),

    #[error("invalid chunking configuration: {0}")]
    Chunking(#[from] ChunkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RetrieverError {
    pub fn corrupt(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::IndexCorrupt {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Whether the embedding backend is unavailable, as opposed to a failure
    /// of a single operation
    pub fn is_missing_capability(&self) -> bool {
        matches!(self, Self::Embedding(e) if e.is_missing_capability())
    }
}
