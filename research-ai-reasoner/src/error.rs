//! Error types for answering and summarizing

use research_ai_retriever::RetrieverError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    /// The summarization backend was requested but cannot be used
    #[error("{capability} is unavailable: {hint}")]
    MissingCapability { capability: String, hint: String },

    /// The backend could not be reached or returned an unusable response
    #[error("summarizer backend {endpoint} failed: {reason}")]
    Backend { endpoint: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Retrieval(#[from] RetrieverError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error("failed to export result to {}: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{capability} is unavailable: {hint}")]
    MissingCapability { capability: String, hint: String },
}

impl ResearchError {
    /// Whether a required backend (embedding model or summarizer) is
    /// unavailable, as opposed to a failure of this one request
    pub fn is_missing_capability(&self) -> bool {
        match self {
            Self::MissingCapability { .. } => true,
            Self::Retrieval(e) => e.is_missing_capability(),
            Self::Summarize(SummarizeError::MissingCapability { .. }) => true,
            _ => false,
        }
    }
}
