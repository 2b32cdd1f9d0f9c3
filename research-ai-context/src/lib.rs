pub mod decompose;
pub mod text;

// Re-export the chunking and decomposition entry points for external use
pub use decompose::decompose;
pub use text::{ChunkError, TextChunk, TokenWindowChunker, chunk_tokens, preview};
