//! Multi-step answering: decompose the question, retrieve evidence for each
//! part, then summarize everything that was found.

use crate::error::ResearchError;
use crate::summarizer::Summarizer;
use research_ai_context::decompose;
use research_ai_retriever::{Retriever, SearchHit};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Evidence and summary produced for one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    /// One `## Subquery:` section per sub-query that returned hits
    pub evidence: String,
    pub summary: String,
}

/// A rendered report and where it was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedAnswer {
    pub markdown: String,
    pub summary: String,
    pub path: PathBuf,
}

/// Format one hit as a citation line followed by the chunk preview
pub fn format_hit(hit: &SearchHit) -> String {
    format!(
        "(source: {} chunk:{} score:{:.3})\n{}",
        hit.metadata.source, hit.metadata.chunk, hit.score, hit.metadata.text_preview
    )
}

/// Render the markdown report for `query`
pub fn render_markdown(query: &str, answer: &Answer) -> String {
    format!(
        "# Research Query\n\n**Query:** {query}\n\n## Retrieved Evidence\n\n{}\n\n## Synthesized Summary\n\n{}",
        answer.evidence, answer.summary
    )
}

pub struct Reasoner {
    retriever: Arc<Retriever>,
    summarizer: Arc<dyn Summarizer>,
}

impl Reasoner {
    pub fn new(retriever: Arc<Retriever>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            retriever,
            summarizer,
        }
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    /// Answer `query` from the active index.
    ///
    /// Each sub-query is retrieved with `topk_per_subquery` hits, in order.
    /// The first retrieval or summarization failure aborts the whole answer.
    ///
    /// # Errors
    /// [`ResearchError::EmptyQuery`] when the query is blank or decomposes into
    /// nothing, otherwise the retrieval or summarizer error.
    pub async fn answer(
        &self,
        query: &str,
        topk_per_subquery: usize,
    ) -> Result<Answer, ResearchError> {
        if query.trim().is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        let subqueries = decompose(query);
        if subqueries.is_empty() {
            return Err(ResearchError::EmptyQuery);
        }
        info!("Answering query with {} sub-queries", subqueries.len());

        let mut sections = Vec::with_capacity(subqueries.len());
        for subquery in &subqueries {
            let hits = self.retriever.query(subquery, topk_per_subquery).await?;
            debug!("Sub-query {:?} returned {} hits", subquery, hits.len());
            if hits.is_empty() {
                continue;
            }

            let evidence = hits.iter().map(format_hit).collect::<Vec<_>>().join("\n\n");
            sections.push(format!("## Subquery: {subquery}\n\n{evidence}"));
        }

        let evidence = sections.join("\n\n");
        let summary = self.summarizer.summarize(&evidence).await?;
        Ok(Answer { evidence, summary })
    }

    /// Answer `query` and write the markdown report to `path`.
    ///
    /// Parent directories are created and an existing file is overwritten.
    pub async fn answer_and_export(
        &self,
        query: &str,
        topk_per_subquery: usize,
        path: &Path,
    ) -> Result<ExportedAnswer, ResearchError> {
        let answer = self.answer(query, topk_per_subquery).await?;
        let markdown = render_markdown(query, &answer);

        let export_error = |source| ResearchError::Export {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(export_error)?;
        }
        tokio::fs::write(path, &markdown).await.map_err(export_error)?;
        info!("Exported answer to {}", path.display());

        Ok(ExportedAnswer {
            markdown,
            summary: answer.summary,
            path: path.to_path_buf(),
        })
    }
}
