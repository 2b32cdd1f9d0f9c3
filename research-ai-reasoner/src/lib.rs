//! # research-ai-reasoner
//!
//! Answers research questions over a local document collection and writes the
//! result as a markdown report.
//!
//! ## Pipeline
//!
//! 1. The question is split into sub-queries (`;`, `,`, then ` and `)
//! 2. Each sub-query retrieves its top-k chunks from the index
//! 3. The collected evidence is summarized, by a hosted model when one is
//!    configured and by keeping the leading sentences otherwise
//!
//! The pieces come from the other workspace crates:
//! - `research-ai-context` for chunking and query decomposition
//! - `research-ai-embed` for embedding providers
//! - `research-ai-retriever` for ingestion and the similarity index
//!
//! ## Quick Start
//!
//! ```no_run
//! use research_ai_reasoner::{ResearchConfig, ResearchContext};
//!
//! # async fn example() -> anyhow::Result<()> {
//! research_ai_reasoner::telemetry::init_tracing(tracing::Level::INFO);
//!
//! let context = ResearchContext::open(ResearchConfig::detect()).await?;
//! let exported = context
//!     .answer_and_export("history of vector search; uses of HNSW")
//!     .await?;
//! println!("{}", exported.summary);
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! [`ResearchConfig`] is plain serde data read from TOML with
//! [`ResearchConfig::load`]. Two profiles are built in: [`ResearchConfig::local`]
//! and [`ResearchConfig::constrained`] for small hosts, picked by
//! [`ResearchConfig::detect`] from the `RENDER` environment variable.
//!
//! ## Error Handling
//!
//! Operations return [`ResearchError`]. A backend that cannot be used at all
//! (unknown embedding model, summarizer requested without an endpoint) is
//! reported as a missing capability with a hint, see
//! [`ResearchError::is_missing_capability`].

pub mod config;
pub mod context;
pub mod error;
pub mod reasoner;
pub mod summarizer;
pub mod telemetry;

pub use config::{ResearchConfig, SummarizerConfig};
pub use context::ResearchContext;
pub use error::{ResearchError, SummarizeError};
pub use reasoner::{Answer, ExportedAnswer, Reasoner, format_hit, render_markdown};
pub use summarizer::{
    BackendSummarizer, NaiveSummarizer, Summarizer, SummarizerChoice, SummarizerKind,
};
