use research_ai_context::{ChunkError, TextChunk, TokenWindowChunker};
use serde::{Deserialize, Serialize};

use super::loader::Document;

/// Configuration for chunking documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Number of whitespace tokens per chunk
    pub chunk_size: usize,
    /// Tokens shared by consecutive chunks of one document
    pub overlap: usize,
    /// Maximum number of chunks embedded per build, 0 (the default) for no
    /// limit
    pub max_chunks: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 50,
            max_chunks: 0,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            ..Self::default()
        }
    }

    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }
}

/// Strategy for chunking documents - delegates windowing to research-ai-context
#[derive(Debug, Clone)]
pub struct ChunkingStrategy {
    config: ChunkingConfig,
    chunker: TokenWindowChunker,
}

impl ChunkingStrategy {
    /// Create a new chunking strategy, rejecting windows that cannot advance
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkError> {
        let chunker = TokenWindowChunker::new(config.chunk_size, config.overlap)?;
        Ok(Self { config, chunker })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Chunk a single document
    pub fn chunk_document(&self, document: &Document) -> Vec<TextChunk> {
        let chunks = self.chunker.get_chunks(&document.source, &document.text);

        tracing::debug!(
            "Chunked {} into {} chunks (size: {}, overlap: {})",
            document.source,
            chunks.len(),
            self.config.chunk_size,
            self.config.overlap
        );

        chunks
    }

    /// Chunk every document in order, applying the `max_chunks` cap
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<TextChunk> {
        let mut chunks: Vec<TextChunk> = documents
            .iter()
            .flat_map(|document| self.chunk_document(document))
            .collect();

        if self.config.max_chunks > 0 && chunks.len() > self.config.max_chunks {
            tracing::warn!(
                "Truncating {} chunks to the configured limit of {}",
                chunks.len(),
                self.config.max_chunks
            );
            chunks.truncate(self.config.max_chunks);
        }

        chunks
    }
}
