//! Condense retrieved evidence into a short summary.
//!
//! Two implementations exist and the choice between them is made once, when
//! the application context is built:
//!
//! - [`BackendSummarizer`] posts the text to a hosted abstractive model
//!   (a Hugging Face style inference endpoint)
//! - [`NaiveSummarizer`] keeps the first six sentences
//!
//! Both return inputs shorter than `min_words` words unchanged apart from
//! trimming. A backend failure is reported as an error, never papered over
//! with the naive result.

use crate::config::SummarizerConfig;
use crate::error::SummarizeError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of leading sentences kept by [`NaiveSummarizer`]
pub const NAIVE_SENTENCES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarizerKind {
    Backend,
    Naive,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError>;

    fn kind(&self) -> SummarizerKind;
}

/// `Some(trimmed text)` when the input is too short to be worth summarizing
fn short_input(text: &str, min_words: usize) -> Option<String> {
    (text.split_whitespace().count() < min_words).then(|| text.trim().to_string())
}

/// Extractive fallback that keeps the leading sentences of the text
#[derive(Debug, Clone)]
pub struct NaiveSummarizer {
    min_words: usize,
}

impl NaiveSummarizer {
    pub fn new(min_words: usize) -> Self {
        Self { min_words }
    }

    fn leading_sentences(text: &str) -> String {
        let sentences: Vec<&str> = text
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(NAIVE_SENTENCES)
            .collect();

        if sentences.is_empty() {
            return String::new();
        }
        format!("{}.", sentences.join(". ")).trim().to_string()
    }
}

impl Default for NaiveSummarizer {
    fn default() -> Self {
        Self::new(SummarizerConfig::default().min_words)
    }
}

#[async_trait]
impl Summarizer for NaiveSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if let Some(short) = short_input(text, self.min_words) {
            return Ok(short);
        }
        Ok(Self::leading_sentences(text))
    }

    fn kind(&self) -> SummarizerKind {
        SummarizerKind::Naive
    }
}

#[derive(Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: SummarizationParameters,
}

#[derive(Serialize)]
struct SummarizationParameters {
    max_length: usize,
    min_length: usize,
}

#[derive(Deserialize)]
struct SummarizationOutput {
    summary_text: String,
}

/// Summarizer backed by a hosted summarization model
#[derive(Debug, Clone)]
pub struct BackendSummarizer {
    client: reqwest::Client,
    endpoint: String,
    api_token: Option<String>,
    min_words: usize,
    max_length: usize,
    min_length: usize,
}

impl BackendSummarizer {
    /// Create a summarizer for the configured endpoint.
    ///
    /// The bearer token is read from the environment variable named by
    /// `api_token_env`; without it requests are sent unauthenticated.
    ///
    /// # Errors
    /// [`SummarizeError::MissingCapability`] when no endpoint is configured.
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SummarizeError::Backend {
                endpoint: config.endpoint.clone().unwrap_or_default(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;
        Self::with_client(config, client)
    }

    /// Like [`BackendSummarizer::new`] with a caller-supplied HTTP client
    pub fn with_client(
        config: &SummarizerConfig,
        client: reqwest::Client,
    ) -> Result<Self, SummarizeError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| SummarizeError::MissingCapability {
                capability: "summarizer backend".to_string(),
                hint: "set summarizer.endpoint to a summarization inference URL, or use the naive summarizer".to_string(),
            })?;

        let api_token = std::env::var(&config.api_token_env)
            .ok()
            .filter(|token| !token.is_empty());

        Ok(Self {
            client,
            endpoint,
            api_token,
            min_words: config.min_words,
            max_length: config.max_length,
            min_length: config.min_length,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn backend_error(&self, reason: impl Into<String>) -> SummarizeError {
        SummarizeError::Backend {
            endpoint: self.endpoint.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Summarizer for BackendSummarizer {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        if let Some(short) = short_input(text, self.min_words) {
            return Ok(short);
        }

        let payload = SummarizationRequest {
            inputs: text,
            parameters: SummarizationParameters {
                max_length: self.max_length,
                min_length: self.min_length,
            },
        };

        debug!(
            "Requesting summary of {} words from {}",
            text.split_whitespace().count(),
            self.endpoint
        );

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.backend_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.backend_error(format!("HTTP {status}: {body}")));
        }

        let outputs: Vec<SummarizationOutput> = response
            .json()
            .await
            .map_err(|e| self.backend_error(format!("invalid response: {e}")))?;

        outputs
            .into_iter()
            .next()
            .map(|output| output.summary_text)
            .ok_or_else(|| self.backend_error("response contained no summary"))
    }

    fn kind(&self) -> SummarizerKind {
        SummarizerKind::Backend
    }
}

/// The summarizer selected for this process
#[derive(Debug, Clone)]
pub enum SummarizerChoice {
    Backend(BackendSummarizer),
    Naive(NaiveSummarizer),
}

impl SummarizerChoice {
    /// The backend when an endpoint is configured, the naive summarizer otherwise
    pub fn resolve(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        match config.endpoint.as_deref().map(str::trim) {
            Some(endpoint) if !endpoint.is_empty() => Self::backend(config),
            _ => Ok(Self::naive(config)),
        }
    }

    /// Require the backend.
    ///
    /// # Errors
    /// [`SummarizeError::MissingCapability`] when no endpoint is configured.
    pub fn backend(config: &SummarizerConfig) -> Result<Self, SummarizeError> {
        Ok(Self::Backend(BackendSummarizer::new(config)?))
    }

    pub fn naive(config: &SummarizerConfig) -> Self {
        Self::Naive(NaiveSummarizer::new(config.min_words))
    }
}

#[async_trait]
impl Summarizer for SummarizerChoice {
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        match self {
            Self::Backend(backend) => backend.summarize(text).await,
            Self::Naive(naive) => naive.summarize(text).await,
        }
    }

    fn kind(&self) -> SummarizerKind {
        match self {
            Self::Backend(_) => SummarizerKind::Backend,
            Self::Naive(_) => SummarizerKind::Naive,
        }
    }
}
