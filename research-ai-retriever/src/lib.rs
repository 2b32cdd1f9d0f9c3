//! research-ai-retriever: document ingestion and semantic retrieval
//!
//! This crate turns a directory of `.txt`, `.md` and `.pdf` documents into an
//! exact similarity index and answers top-k queries against it.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: document loading, chunking and the [`Retriever`] that
//!   builds, loads and queries the index
//! - **[`storage`]**: the in-memory [`FlatIndex`] and its on-disk artifacts
//! - **[`error`]**: the [`RetrieverError`] type
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use research_ai_embed::{EmbedConfig, create_provider};
//! use research_ai_retriever::{Retriever, RetrieverConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let provider = create_provider(&EmbedConfig::default()).await?;
//! let retriever = Retriever::new(RetrieverConfig::new("data", "outputs/index"), provider);
//!
//! retriever.build_or_load_index(false).await?;
//! for hit in retriever.query("what is retrieval augmented generation?", 3).await? {
//!     println!("{} #{} ({:.3})", hit.metadata.source, hit.metadata.chunk, hit.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! data_dir → loader → ChunkingStrategy → EmbeddingProvider → FlatIndex
//!                                                              ↓    ↑
//!                                        vectors.bin + meta.json (index_dir)
//! ```

pub mod error;
pub mod retrieval;
pub mod storage;

pub use error::{Result, RetrieverError};
pub use retrieval::chunking_strategy::{ChunkingConfig, ChunkingStrategy};
pub use retrieval::loader::{Document, DocumentKind, FileFault, LoadReport, LoaderError};
pub use retrieval::retriever::{BuildOutcome, IndexState, IndexStatus, Retriever, RetrieverConfig};
pub use storage::{ChunkMetadata, FlatIndex, IndexManifest, SearchHit};
