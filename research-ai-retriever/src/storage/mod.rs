//! Persistence for the similarity index.
//!
//! The index is a single exact (brute-force) inner-product structure held fully
//! in memory. [`flat_index::FlatIndex`] owns both the vectors and the chunk
//! metadata, so the two can never drift apart, and persists them as a pair of
//! artifacts that are written and loaded together.

pub mod flat_index;

pub use flat_index::{ChunkMetadata, FlatIndex, IndexManifest, SearchHit};
