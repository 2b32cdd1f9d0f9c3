//! # research-ai-embed
//!
//! Text embedding providers for the research assistant. A provider turns text
//! into fixed-dimension `f32` vectors; two vectors are only comparable when
//! they come from providers with the same [`EmbeddingProvider::model_id`].
//!
//! ## Providers
//!
//! - [`FastEmbedProvider`]: local ONNX sentence-transformer models run through
//!   fastembed (`all-MiniLM-L6-v2`, `all-MiniLM-L12-v2`, `bge-small-en-v1.5`)
//! - [`HashingEmbedProvider`]: deterministic feature hashing that needs no model
//!   files, selected with model names of the form `hashing-<dimension>`
//!
//! ## Quick Start
//!
//! ```
//! use research_ai_embed::{EmbedConfig, create_provider};
//!
//! # async fn example() -> research_ai_embed::Result<()> {
//! let provider = create_provider(&EmbedConfig::hashing(64)).await?;
//!
//! let texts = vec!["Hello world".to_string(), "How are you?".to_string()];
//! let result = provider.embed_texts(&texts).await?;
//!
//! assert_eq!(result.len(), 2);
//! assert_eq!(result.dimension, 64);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`Result<T>`] using the crate's [`EmbedError`] type.
//! A model that cannot be served surfaces as [`EmbedError::MissingCapability`]
//! with a hint naming the alternatives, never as a panic.

pub mod config;
pub mod error;
pub mod provider;

// Re-export main types for easy access
pub use config::{EmbedConfig, ModelFamily};
pub use error::{EmbedError, Result};
pub use provider::{
    EmbeddingProvider, EmbeddingResult, FastEmbedProvider, HashingEmbedProvider, create_provider,
    l2_normalize,
};
