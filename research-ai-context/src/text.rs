//! This module turns raw document text into fixed-size, overlapping token windows
//! ("chunks") that are small enough to embed and specific enough to retrieve.
//!
//! A token is a maximal run of non-whitespace characters. A window of `chunk_size`
//! tokens slides over the document, advancing `chunk_size - overlap` tokens per
//! step, and every window is re-joined with single spaces. The last windows of a
//! document may be shorter than `chunk_size`.
//!
//! The module defines two main structs:
//! - [`TokenWindowChunker`]: Validated window configuration that splits text.
//! - [`TextChunk`]: A single window extracted from a source document, along with
//!   its position in that document.
//!
//! # Example
//!
//! ```
//! use research_ai_context::text::TokenWindowChunker;
//!
//! let chunker = TokenWindowChunker::new(2, 0).unwrap();
//! let chunks = chunker.get_chunks("a.txt", "alpha beta gamma delta");
//!
//! let texts: Vec<&str> = chunks.iter().map(|c| c.chunk_text.as_str()).collect();
//! assert_eq!(texts, vec!["alpha beta", "gamma delta"]);
//! assert_eq!(chunks[1].sequence, 1);
//! assert_eq!(chunks[1].source, "a.txt");
//! ```
//!
//! # Overlap
//!
//! With a non-zero overlap every window repeats the last `overlap` tokens of the
//! previous one. [`TokenWindowChunker::reassemble`] drops those repeated tokens
//! again, so chunking followed by reassembly yields the original token sequence:
//!
//! ```
//! use research_ai_context::text::TokenWindowChunker;
//!
//! let chunker = TokenWindowChunker::new(4, 2).unwrap();
//! let text = "one two three four five six seven";
//! let windows = chunker.split(text);
//! assert_eq!(windows[0], "one two three four");
//! assert_eq!(windows[1], "three four five six");
//!
//! let tokens: Vec<&str> = text.split_whitespace().collect();
//! assert_eq!(chunker.reassemble(&windows), tokens);
//! ```
use serde::{Serialize, Serializer};

/// Number of characters kept in a chunk preview.
pub const PREVIEW_CHARS: usize = 200;

/// Errors raised when a window configuration cannot make progress.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkError {
    /// A window must hold at least one token
    #[error("chunk_size must be greater than zero")]
    ZeroChunkSize,

    /// The window would never advance
    #[error("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})")]
    OverlapTooLarge { chunk_size: usize, overlap: usize },
}

/// Split `text` into windows of `chunk_size` whitespace tokens that overlap by
/// `overlap` tokens.
///
/// Convenience wrapper around [`TokenWindowChunker`] for one-off calls.
///
/// # Errors
/// [`ChunkError::ZeroChunkSize`] when `chunk_size == 0` and
/// [`ChunkError::OverlapTooLarge`] when `overlap >= chunk_size`.
///
/// # Examples
/// ```
/// use research_ai_context::chunk_tokens;
///
/// assert!(chunk_tokens("", 3, 1).unwrap().is_empty());
/// assert!(chunk_tokens("a b c", 3, 3).is_err());
/// ```
pub fn chunk_tokens(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>, ChunkError> {
    Ok(TokenWindowChunker::new(chunk_size, overlap)?.split(text))
}

/// Return the first [`PREVIEW_CHARS`] characters of `text`.
///
/// Counting is done in `char`s, so the cut never lands inside a multi-byte
/// sequence.
pub fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Sliding token window configuration.
///
/// Construction validates the window, so every `TokenWindowChunker` is
/// guaranteed to advance at least one token per step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenWindowChunker {
    chunk_size: usize,
    overlap: usize,
}

/// A single token window extracted from a source document.
///
/// `sequence` is the 0-based position of the window within its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The file name of the document the window was taken from.
    pub source: String,
    /// The sequence number of this chunk within the document (0-indexed).
    pub sequence: usize,
    /// The window's tokens joined with single spaces.
    pub chunk_text: String,
}

impl Serialize for TextChunk {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("TextChunk", 4)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("sequence", &self.sequence)?;
        state.serialize_field("chunk_text", &self.chunk_text)?;
        state.serialize_field("preview", &self.preview())?;
        state.end()
    }
}

impl TokenWindowChunker {
    /// Creates a new chunker.
    ///
    /// # Arguments
    ///
    /// *   `chunk_size` - Number of tokens per window, must be positive.
    /// *   `overlap` - Number of tokens shared by consecutive windows, must be
    ///     smaller than `chunk_size`.
    ///
    /// # Errors
    ///
    /// Returns a [`ChunkError`] for configurations whose window would never
    /// advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::ZeroChunkSize);
        }
        if overlap >= chunk_size {
            return Err(ChunkError::OverlapTooLarge {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of tokens the window advances per step.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Splits `text` into window strings.
    ///
    /// Windows start at token `0, stride, 2 * stride, ...` until the start
    /// reaches the token count. Empty or whitespace-only text yields no windows.
    pub fn split(&self, text: &str) -> Vec<String> {
        let tokens: Vec<&str> = text.split_whitespace().collect();
        let mut windows = Vec::with_capacity(tokens.len().div_ceil(self.stride()));

        let mut start = 0;
        while start < tokens.len() {
            let end = (start + self.chunk_size).min(tokens.len());
            windows.push(tokens[start..end].join(" "));
            start += self.stride();
        }

        windows
    }

    /// Splits a document into [`TextChunk`]s tagged with `source`.
    pub fn get_chunks(&self, source: &str, content: &str) -> Vec<TextChunk> {
        self.split(content)
            .into_iter()
            .enumerate()
            .map(|(sequence, chunk_text)| TextChunk {
                source: source.to_string(),
                sequence,
                chunk_text,
            })
            .collect()
    }

    /// Rebuilds the token sequence of a document from its windows.
    ///
    /// The first window is taken whole; every later window contributes only the
    /// tokens after its first `overlap`. Windows must be passed in sequence order.
    pub fn reassemble<S: AsRef<str>>(&self, windows: &[S]) -> Vec<String> {
        windows
            .iter()
            .enumerate()
            .flat_map(|(i, window)| {
                let skip = if i == 0 { 0 } else { self.overlap };
                window
                    .as_ref()
                    .split_whitespace()
                    .skip(skip)
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

impl TextChunk {
    /// First [`PREVIEW_CHARS`] characters of the chunk text.
    pub fn preview(&self) -> String {
        preview(&self.chunk_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_split_without_overlap() {
        let chunks = chunk_tokens("alpha beta gamma delta", 2, 0).unwrap();
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_split_collapses_whitespace() {
        let chunks = chunk_tokens("  alpha\n\tbeta   gamma \r\n", 5, 0).unwrap();
        assert_eq!(chunks, vec!["alpha beta gamma"]);
    }

    #[test]
    fn test_split_empty_content() {
        assert!(chunk_tokens("", 4, 1).unwrap().is_empty());
        assert!(chunk_tokens(" \n\t ", 4, 1).unwrap().is_empty());
    }

    #[test]
    fn test_trailing_windows_are_shorter() {
        let chunks = chunk_tokens("a b c d e", 3, 1).unwrap();
        assert_eq!(chunks, vec!["a b c", "c d e", "e"]);
    }

    #[test]
    fn test_maximal_overlap_advances_one_token() {
        let chunker = TokenWindowChunker::new(3, 2).unwrap();
        assert_eq!(chunker.stride(), 1);
        let chunks = chunker.split("a b c d");
        assert_eq!(chunks, vec!["a b c", "b c d", "c d", "d"]);
    }

    #[test]
    fn test_degenerate_configurations_rejected() {
        assert_eq!(
            TokenWindowChunker::new(0, 0),
            Err(ChunkError::ZeroChunkSize)
        );
        assert_eq!(
            TokenWindowChunker::new(4, 4),
            Err(ChunkError::OverlapTooLarge {
                chunk_size: 4,
                overlap: 4
            })
        );
        assert!(chunk_tokens("a b c", 2, 7).is_err());
    }

    #[test]
    fn test_reassemble_restores_token_sequence() {
        let text = "The quick brown fox jumps over the lazy dog while seven \
                    wizards quietly hex the jovial bumbling kobold near an old mill";
        let expected = tokens(text);

        for chunk_size in 1..=12 {
            for overlap in 0..chunk_size {
                let chunker = TokenWindowChunker::new(chunk_size, overlap).unwrap();
                let windows = chunker.split(text);
                assert_eq!(
                    chunker.reassemble(&windows),
                    expected,
                    "chunk_size={chunk_size} overlap={overlap}"
                );
            }
        }
    }

    #[test]
    fn test_get_chunks_metadata() {
        let chunker = TokenWindowChunker::new(2, 1).unwrap();
        let chunks = chunker.get_chunks("notes.md", "one two three");

        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.source, "notes.md");
            assert_eq!(chunk.sequence, i);
        }
        assert_eq!(chunks[1].chunk_text, "two three");
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let text = "é".repeat(PREVIEW_CHARS + 10);
        let p = preview(&text);
        assert_eq!(p.chars().count(), PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_chunk_serializes_preview() {
        let chunk = TextChunk {
            source: "a.txt".to_string(),
            sequence: 0,
            chunk_text: "alpha beta".to_string(),
        };
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json["source"], "a.txt");
        assert_eq!(json["preview"], "alpha beta");
    }
}
