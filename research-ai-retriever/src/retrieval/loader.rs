//! Discovery and text extraction for documents in the data directory.
//!
//! Only regular, non-hidden files directly inside the data directory are
//! considered, and only when their extension (compared case-insensitively) is one of `txt`,
//! `md` or `pdf`. Plain text is decoded as UTF-8 with invalid bytes replaced.
//! PDFs are parsed with `lopdf` page by page on a blocking thread.
//!
//! A broken file never aborts ingestion: [`load_documents`] records it as a
//! [`FileFault`] and moves on to the next one.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Per-file ingestion failures
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// The extension is not one the loader understands
    #[error("unsupported file type: {}", path.display())]
    UnsupportedFileType { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse PDF {}: {reason}", path.display())]
    Pdf { path: PathBuf, reason: String },

    #[error("PDF extraction task for {} failed: {source}", path.display())]
    Task {
        path: PathBuf,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Document formats the loader can extract text from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Markdown,
    Pdf,
}

impl DocumentKind {
    /// Classify a path by its extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "txt" => Some(Self::Text),
            "md" => Some(Self::Markdown),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

/// A document whose text has been extracted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name without directories, used as the chunk source
    pub source: String,
    pub path: PathBuf,
    pub kind: DocumentKind,
    pub text: String,
}

/// A file that could not be ingested, with the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFault {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of loading every supported file in a directory
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Documents with non-empty text, in file name order
    pub documents: Vec<Document>,
    /// Files that failed to load
    pub faults: Vec<FileFault>,
}

/// List the supported files directly inside `dir`, sorted by file name.
///
/// A missing directory yields an empty list.
pub async fn scan_data_dir(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Data directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if hidden || DocumentKind::from_path(&path).is_none() {
            continue;
        }
        // metadata() follows symlinks, so a link to a regular file counts
        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    debug!("Found {} supported files in {}", files.len(), dir.display());
    Ok(files)
}

/// Extract the text of a single file.
///
/// # Errors
/// [`LoaderError::UnsupportedFileType`] for unknown extensions, otherwise the
/// read or parse failure of this one file.
pub async fn read_document(path: &Path) -> Result<String, LoaderError> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| LoaderError::UnsupportedFileType {
        path: path.to_path_buf(),
    })?;

    let bytes = tokio::fs::read(path).await.map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match kind {
        DocumentKind::Text | DocumentKind::Markdown => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        DocumentKind::Pdf => {
            let owned_path = path.to_path_buf();
            tokio::task::spawn_blocking(move || extract_pdf_text(&owned_path, &bytes))
                .await
                .map_err(|source| LoaderError::Task {
                    path: path.to_path_buf(),
                    source,
                })?
        }
    }
}

/// Concatenate the text of every page in page-number order. Pages whose text
/// cannot be extracted contribute nothing.
fn extract_pdf_text(path: &Path, bytes: &[u8]) -> Result<String, LoaderError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| LoaderError::Pdf {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    // get_pages() is a BTreeMap keyed by page number, so iteration is ordered
    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!(
                "No text extracted from page {} of {}: {}",
                page_number,
                path.display(),
                e
            ),
        }
    }
    Ok(text)
}

/// Load every supported document in `dir`.
///
/// Files that fail are logged and reported in [`LoadReport::faults`]; files
/// whose text is empty after extraction are skipped silently.
///
/// # Errors
/// Only a failure to list the directory itself is returned.
pub async fn load_documents(dir: &Path) -> std::io::Result<LoadReport> {
    let mut report = LoadReport::default();

    for path in scan_data_dir(dir).await? {
        let Some(kind) = DocumentKind::from_path(&path) else {
            continue;
        };

        match read_document(&path).await {
            Ok(text) if text.trim().is_empty() => {
                debug!("Skipping {}: no text content", path.display());
            }
            Ok(text) => {
                let source = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                report.documents.push(Document {
                    source,
                    path,
                    kind,
                    text,
                });
            }
            Err(e) => {
                warn!("Failed to load {}: {}", path.display(), e);
                report.faults.push(FileFault {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        "Loaded {} documents from {} ({} failed)",
        report.documents.len(),
        dir.display(),
        report.faults.len()
    );
    Ok(report)
}
