//! Exact inner-product index over L2-normalized vectors, persisted as two
//! artifacts inside an index directory:
//!
//! - `vectors.bin`: the magic `RAIVEC01`, the dimension as u32 LE, the vector
//!   count as u64 LE, then `count * dimension` f32 LE values
//! - `meta.json`: chunk metadata in vector order plus an [`IndexManifest`]
//!
//! The two artifacts are always written and loaded together. The manifest
//! pins the embedding model and carries the blake3 checksum of `vectors.bin`,
//! so a vectors file that does not belong to its metadata is detected on load.

use crate::error::{Result, RetrieverError};
use crate::retrieval::chunking_strategy::ChunkingConfig;
use research_ai_context::TextChunk;
use research_ai_embed::{EmbedError, EmbeddingProvider, l2_normalize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub const VECTORS_FILE: &str = "vectors.bin";
pub const META_FILE: &str = "meta.json";

/// Version of the on-disk layout
pub const FORMAT_VERSION: u32 = 1;

const MAGIC: &[u8; 8] = b"RAIVEC01";
const HEADER_LEN: usize = MAGIC.len() + 4 + 8;

/// Metadata stored for every indexed chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File name of the source document
    pub source: String,
    /// Position of the chunk within its document
    pub chunk: usize,
    /// First 200 characters of the chunk text
    pub text_preview: String,
}

impl From<&TextChunk> for ChunkMetadata {
    fn from(chunk: &TextChunk) -> Self {
        Self {
            source: chunk.source.clone(),
            chunk: chunk.sequence,
            text_preview: chunk.preview(),
        }
    }
}

/// Identity and integrity record of a persisted index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Embedding space the vectors live in, see `EmbeddingProvider::model_id`
    pub model_id: String,
    pub dimension: usize,
    pub count: usize,
    pub chunk_size: usize,
    pub overlap: usize,
    /// Chunk cap the index was built with, 0 when uncapped
    #[serde(default)]
    pub max_chunks: usize,
    /// blake3 hex digest of the complete `vectors.bin`
    pub vectors_blake3: String,
}

#[derive(Serialize, Deserialize)]
struct PersistedMeta {
    metadatas: Vec<ChunkMetadata>,
    manifest: IndexManifest,
}

/// A single search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub metadata: ChunkMetadata,
    /// Inner product with the query, the cosine similarity for unit vectors
    pub score: f32,
}

/// Exact similarity index with positional correspondence between vectors and
/// chunk metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    model_id: String,
    dimension: usize,
    chunking: ChunkingConfig,
    /// Row-major `len() * dimension` values
    vectors: Vec<f32>,
    metadatas: Vec<ChunkMetadata>,
}

impl FlatIndex {
    /// Create an index from per-chunk vectors, normalizing each one.
    ///
    /// # Errors
    /// [`RetrieverError::VectorCountMismatch`] when the number of vectors
    /// differs from the number of metadata entries, and
    /// [`RetrieverError::Embedding`] when a vector does not have `dimension`
    /// values.
    pub fn new(
        model_id: impl Into<String>,
        dimension: usize,
        chunking: ChunkingConfig,
        vectors: Vec<Vec<f32>>,
        metadatas: Vec<ChunkMetadata>,
    ) -> Result<Self> {
        if vectors.len() != metadatas.len() {
            return Err(RetrieverError::VectorCountMismatch {
                vectors: vectors.len(),
                chunks: metadatas.len(),
            });
        }

        let mut flat = Vec::with_capacity(vectors.len() * dimension);
        for mut vector in vectors {
            if vector.len() != dimension {
                return Err(EmbedError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                }
                .into());
            }
            l2_normalize(&mut vector);
            flat.extend_from_slice(&vector);
        }

        Ok(Self {
            model_id: model_id.into(),
            dimension,
            chunking,
            vectors: flat,
            metadatas,
        })
    }

    /// An index that holds no chunks
    pub fn empty(model_id: impl Into<String>, dimension: usize, chunking: ChunkingConfig) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
            chunking,
            vectors: Vec::new(),
            metadatas: Vec::new(),
        }
    }

    /// Embed every chunk through `provider` and build the index.
    pub async fn build(
        chunks: &[TextChunk],
        provider: &dyn EmbeddingProvider,
        chunking: ChunkingConfig,
    ) -> Result<Self> {
        let dimension = provider.embedding_dimension();
        if chunks.is_empty() {
            return Ok(Self::empty(provider.model_id(), dimension, chunking));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.chunk_text.clone()).collect();
        debug!("Embedding {} chunks with {}", texts.len(), provider.model_id());
        let result = provider.embed_texts(&texts).await?;

        let metadatas = chunks.iter().map(ChunkMetadata::from).collect();
        Self::new(
            provider.model_id(),
            dimension,
            chunking,
            result.embeddings,
            metadatas,
        )
    }

    pub fn len(&self) -> usize {
        self.metadatas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadatas.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn chunking(&self) -> ChunkingConfig {
        self.chunking
    }

    pub fn metadatas(&self) -> &[ChunkMetadata] {
        &self.metadatas
    }

    /// The stored (normalized) vector at `position`
    pub fn vector(&self, position: usize) -> Option<&[f32]> {
        if position >= self.len() {
            return None;
        }
        let start = position * self.dimension;
        Some(&self.vectors[start..start + self.dimension])
    }

    /// Number of distinct source documents
    pub fn source_count(&self) -> usize {
        self.metadatas
            .iter()
            .map(|m| m.source.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Score every vector against `query` and return the best `top_k`.
    ///
    /// Results are ordered by descending score; equal scores keep insertion
    /// order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dimension {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            }
            .into());
        }

        let mut scored: Vec<(usize, f32)> = (0..self.len())
            .filter_map(|i| self.vector(i).map(|v| (i, dot(v, query))))
            .collect();
        // sort_by is stable
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchHit {
                metadata: self.metadatas[i].clone(),
                score,
            })
            .collect())
    }

    fn manifest(&self, vectors_blake3: String) -> IndexManifest {
        IndexManifest {
            format_version: FORMAT_VERSION,
            model_id: self.model_id.clone(),
            dimension: self.dimension,
            count: self.len(),
            chunk_size: self.chunking.chunk_size,
            overlap: self.chunking.overlap,
            max_chunks: self.chunking.max_chunks,
            vectors_blake3,
        }
    }

    fn encode_vectors(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());

        // Reinterpret as little-endian bit patterns; a no-op on LE targets
        let little_endian: Vec<u32> = self.vectors.iter().map(|v| v.to_bits().to_le()).collect();
        bytes.extend_from_slice(bytemuck::cast_slice(&little_endian));
        bytes
    }

    /// Persist both artifacts into `dir`.
    ///
    /// Each artifact is written to a `.tmp` sibling and synced first. The
    /// vectors are renamed into place before the metadata, and the metadata
    /// carries the vectors checksum, so an interrupted save never loads as a
    /// valid index.
    pub async fn save(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;

        let vectors_bytes = self.encode_vectors();
        let checksum = blake3::hash(&vectors_bytes).to_hex().to_string();
        let persisted = PersistedMeta {
            metadatas: self.metadatas.clone(),
            manifest: self.manifest(checksum),
        };
        let meta_bytes = serde_json::to_vec_pretty(&persisted)?;

        let vectors_path = dir.join(VECTORS_FILE);
        let meta_path = dir.join(META_FILE);
        let vectors_tmp = vectors_path.with_extension("bin.tmp");
        let meta_tmp = meta_path.with_extension("json.tmp");

        write_synced(&vectors_tmp, &vectors_bytes).await?;
        write_synced(&meta_tmp, &meta_bytes).await?;
        tokio::fs::rename(&vectors_tmp, &vectors_path).await?;
        tokio::fs::rename(&meta_tmp, &meta_path).await?;

        info!(
            "Saved index with {} chunks ({}) to {}",
            self.len(),
            self.model_id,
            dir.display()
        );
        Ok(())
    }

    /// Load both artifacts from `dir`.
    ///
    /// # Errors
    /// [`RetrieverError::IndexCorrupt`] when an artifact is missing or
    /// unreadable, malformed, inconsistent with the other one, or fails its
    /// checksum.
    pub async fn load(dir: &Path) -> Result<Self> {
        let vectors_path = dir.join(VECTORS_FILE);
        let meta_path = dir.join(META_FILE);

        let vectors_bytes = read_artifact(&vectors_path).await?;
        let meta_bytes = read_artifact(&meta_path).await?;

        let persisted: PersistedMeta = serde_json::from_slice(&meta_bytes)
            .map_err(|e| RetrieverError::corrupt(&meta_path, format!("malformed metadata: {e}")))?;
        let manifest = persisted.manifest;

        if manifest.format_version != FORMAT_VERSION {
            return Err(RetrieverError::corrupt(
                &meta_path,
                format!(
                    "unsupported format_version {} (expected {FORMAT_VERSION})",
                    manifest.format_version
                ),
            ));
        }

        let checksum = blake3::hash(&vectors_bytes).to_hex().to_string();
        if checksum != manifest.vectors_blake3 {
            return Err(RetrieverError::corrupt(
                &vectors_path,
                "checksum does not match the metadata manifest",
            ));
        }

        let (dimension, vectors) = decode_vectors(&vectors_path, &vectors_bytes)?;
        let count = if dimension == 0 { 0 } else { vectors.len() / dimension };

        if dimension != manifest.dimension || count != manifest.count {
            return Err(RetrieverError::corrupt(
                &vectors_path,
                format!(
                    "holds {count} vectors of dimension {dimension}, manifest records {} of dimension {}",
                    manifest.count, manifest.dimension
                ),
            ));
        }
        if persisted.metadatas.len() != count {
            return Err(RetrieverError::corrupt(
                &meta_path,
                format!(
                    "{} metadata entries for {count} vectors",
                    persisted.metadatas.len()
                ),
            ));
        }

        info!(
            "Loaded index with {} chunks ({}) from {}",
            count,
            manifest.model_id,
            dir.display()
        );

        Ok(Self {
            model_id: manifest.model_id,
            dimension,
            chunking: ChunkingConfig {
                chunk_size: manifest.chunk_size,
                overlap: manifest.overlap,
                max_chunks: manifest.max_chunks,
            },
            vectors,
            metadatas: persisted.metadatas,
        })
    }

    /// Whether either artifact exists in `dir`
    pub async fn has_artifacts(dir: &Path) -> bool {
        for name in [VECTORS_FILE, META_FILE] {
            if tokio::fs::try_exists(dir.join(name)).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }

    /// Delete both artifacts from `dir` if present
    pub async fn remove_artifacts(dir: &Path) -> Result<()> {
        for name in [VECTORS_FILE, META_FILE] {
            match tokio::fs::remove_file(dir.join(name)).await {
                Ok(()) => debug!("Removed stale {}", dir.join(name).display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        let reason = if e.kind() == std::io::ErrorKind::NotFound {
            "artifact is missing".to_string()
        } else {
            format!("artifact is unreadable: {e}")
        };
        RetrieverError::corrupt(path, reason)
    })
}

fn decode_vectors(path: &Path, bytes: &[u8]) -> Result<(usize, Vec<f32>)> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Err(RetrieverError::corrupt(path, "not a vectors file"));
    }

    let mut dimension_bytes = [0u8; 4];
    dimension_bytes.copy_from_slice(&bytes[8..12]);
    let mut count_bytes = [0u8; 8];
    count_bytes.copy_from_slice(&bytes[12..20]);
    let dimension = u32::from_le_bytes(dimension_bytes) as usize;
    let count = u64::from_le_bytes(count_bytes) as usize;

    let body = &bytes[HEADER_LEN..];
    let expected = count
        .checked_mul(dimension)
        .and_then(|values| values.checked_mul(4));
    if expected != Some(body.len()) {
        return Err(RetrieverError::corrupt(
            path,
            format!(
                "header declares {count} vectors of dimension {dimension} but body has {} bytes",
                body.len()
            ),
        ));
    }

    // Copy into an aligned buffer, then fix up byte order
    let mut values = vec![0u32; body.len() / 4];
    bytemuck::cast_slice_mut::<u32, u8>(&mut values).copy_from_slice(body);
    let vectors = values
        .into_iter()
        .map(|bits| f32::from_bits(u32::from_le(bits)))
        .collect();

    Ok((dimension, vectors))
}
