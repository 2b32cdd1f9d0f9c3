//! Integration tests for the build → persist → load → query pipeline
//!
//! These tests use the hashing embedder so they run offline:
//! - Building an index from a data directory and querying it
//! - Loading a persisted index instead of rebuilding
//! - Rejecting or rebuilding broken and foreign artifacts
//! - Empty data directories

use anyhow::Result;
use research_ai_embed::{EmbeddingProvider, HashingEmbedProvider};
use research_ai_retriever::storage::flat_index::{META_FILE, VECTORS_FILE};
use research_ai_retriever::{
    BuildOutcome, ChunkingConfig, FlatIndex, Retriever, RetrieverConfig, RetrieverError,
};
use std::path::Path;
use std::sync::Arc;
use tempfile::{TempDir, tempdir};

fn hashing(dimension: usize) -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashingEmbedProvider::new(dimension).expect("positive dimension"))
}

/// A workspace with `data/` populated from `files` and an `index/` path
fn workspace(files: &[(&str, &str)]) -> Result<TempDir> {
    let dir = tempdir()?;
    let data = dir.path().join("data");
    std::fs::create_dir(&data)?;
    for (name, content) in files {
        std::fs::write(data.join(name), content)?;
    }
    Ok(dir)
}

fn config(root: &Path, chunk_size: usize, overlap: usize) -> RetrieverConfig {
    RetrieverConfig::new(root.join("data"), root.join("index"))
        .with_chunking(ChunkingConfig::new(chunk_size, overlap))
}

#[tokio::test]
async fn test_single_file_scenario() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta gamma delta")])?;
    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(64));

    let outcome = retriever.build_or_load_index(false).await?;
    assert_eq!(
        outcome,
        BuildOutcome::Built {
            chunks: 2,
            documents: 1,
            faults: vec![]
        }
    );

    let index = retriever.current_index().await.expect("index is active");
    let previews: Vec<&str> = index
        .metadatas()
        .iter()
        .map(|m| m.text_preview.as_str())
        .collect();
    assert_eq!(previews, vec!["alpha beta", "gamma delta"]);
    assert!(index.metadatas().iter().all(|m| m.source == "a.txt"));

    let hits = retriever.query("gamma delta", 1).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].metadata.chunk, 1);
    assert!((hits[0].score - 1.0).abs() < 1e-5);
    Ok(())
}

#[tokio::test]
async fn test_query_before_build_is_not_ready() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta")])?;
    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(16));

    let err = retriever.query("alpha", 3).await.unwrap_err();
    assert!(matches!(err, RetrieverError::IndexNotReady));
    Ok(())
}

#[tokio::test]
async fn test_topk_hits_are_bounded_and_sorted() -> Result<()> {
    let dir = workspace(&[
        (
            "rust.md",
            "Rust ownership rules prevent data races. Borrowing lets functions use values \
             without taking ownership. Lifetimes describe how long references stay valid.",
        ),
        (
            "bread.txt",
            "Sourdough bread needs a starter, flour, water and salt. Long fermentation \
             develops flavour and the crust browns in a hot oven.",
        ),
        (
            "search.txt",
            "Vector search ranks documents by cosine similarity between embeddings. \
             Exact search compares the query against every stored vector.",
        ),
    ])?;
    let retriever = Retriever::new(config(dir.path(), 8, 2), hashing(128));
    let outcome = retriever.build_or_load_index(false).await?;
    let total = outcome.chunks();
    assert!(total > 3);

    for top_k in [1, 2, 5, total, total + 10] {
        let hits = retriever.query("ownership and borrowing in rust", top_k).await?;
        assert!(hits.len() <= top_k);
        assert_eq!(hits.len(), top_k.min(total));
        for hit in &hits {
            assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&hit.score), "{}", hit.score);
        }
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    let best = retriever.query("ownership and borrowing in rust", 1).await?;
    assert_eq!(best[0].metadata.source, "rust.md");
    Ok(())
}

#[tokio::test]
async fn test_persisted_index_is_loaded() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta gamma delta"), ("b.md", "epsilon zeta eta")])?;

    let first = Retriever::new(config(dir.path(), 2, 0), hashing(32));
    let built = first.build_or_load_index(false).await?;
    let expected = first.query("epsilon zeta", 2).await?;

    let second = Retriever::new(config(dir.path(), 2, 0), hashing(32));
    let loaded = second.build_or_load_index(false).await?;
    assert_eq!(
        loaded,
        BuildOutcome::Loaded {
            chunks: built.chunks()
        }
    );

    let actual = second.query("epsilon zeta", 2).await?;
    assert_eq!(actual.len(), expected.len());
    for (a, b) in actual.iter().zip(&expected) {
        assert_eq!(a.metadata, b.metadata);
        assert!((a.score - b.score).abs() < 1e-6);
    }
    Ok(())
}

#[tokio::test]
async fn test_rebuild_is_byte_identical() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta gamma delta"), ("b.txt", "one two three")])?;
    let retriever = Retriever::new(config(dir.path(), 2, 1), hashing(32));
    let meta_path = dir.path().join("index").join(META_FILE);
    let vectors_path = dir.path().join("index").join(VECTORS_FILE);

    retriever.build_or_load_index(true).await?;
    let meta_first = std::fs::read(&meta_path)?;
    let vectors_first = std::fs::read(&vectors_path)?;

    retriever.rebuild().await?;
    assert_eq!(std::fs::read(&meta_path)?, meta_first);
    assert_eq!(std::fs::read(&vectors_path)?, vectors_first);
    Ok(())
}

#[tokio::test]
async fn test_deleted_vectors_are_rebuilt() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta gamma delta")])?;
    let index_dir = dir.path().join("index");

    Retriever::new(config(dir.path(), 2, 0), hashing(16))
        .build_or_load_index(false)
        .await?;
    std::fs::remove_file(index_dir.join(VECTORS_FILE))?;

    let err = FlatIndex::load(&index_dir).await.unwrap_err();
    assert!(matches!(err, RetrieverError::IndexCorrupt { .. }));

    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(16));
    let outcome = retriever.build_or_load_index(false).await?;
    assert!(matches!(outcome, BuildOutcome::Built { chunks: 2, .. }));
    assert!(index_dir.join(VECTORS_FILE).exists());
    Ok(())
}

#[tokio::test]
async fn test_index_from_other_model_is_rebuilt() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta gamma delta")])?;
    let index_dir = dir.path().join("index");

    Retriever::new(config(dir.path(), 2, 0), hashing(16))
        .build_or_load_index(false)
        .await?;

    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(24));
    let outcome = retriever.build_or_load_index(false).await?;
    assert!(matches!(outcome, BuildOutcome::Built { .. }));

    let reloaded = FlatIndex::load(&index_dir).await?;
    assert_eq!(reloaded.model_id(), "hashing:hashing-24:24");
    assert_eq!(reloaded.dimension(), 24);
    Ok(())
}

#[tokio::test]
async fn test_query_with_foreign_index_is_model_mismatch() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta gamma delta")])?;
    Retriever::new(config(dir.path(), 2, 0), hashing(16))
        .build_or_load_index(false)
        .await?;

    let index = FlatIndex::load(&dir.path().join("index")).await?;
    let retriever = Retriever::from_index(config(dir.path(), 2, 0), hashing(32), index);

    match retriever.query("alpha", 1).await {
        Err(RetrieverError::ModelMismatch {
            index_model,
            query_model,
        }) => {
            assert_eq!(index_model, "hashing:hashing-16:16");
            assert_eq!(query_model, "hashing:hashing-32:32");
        }
        other => panic!("expected ModelMismatch, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_empty_data_dir_yields_empty_index() -> Result<()> {
    let dir = workspace(&[("a.txt", "alpha beta")])?;
    let index_dir = dir.path().join("index");
    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(16));
    retriever.build_or_load_index(false).await?;
    assert!(index_dir.join(META_FILE).exists());

    // Remove the only document and rebuild: stale artifacts must go too
    std::fs::remove_file(dir.path().join("data").join("a.txt"))?;
    let outcome = retriever.rebuild().await?;
    assert_eq!(outcome, BuildOutcome::Empty { faults: vec![] });
    assert!(!index_dir.join(META_FILE).exists());
    assert!(!index_dir.join(VECTORS_FILE).exists());

    let err = retriever.query("alpha", 1).await.unwrap_err();
    assert!(matches!(err, RetrieverError::IndexEmpty));
    Ok(())
}

#[tokio::test]
async fn test_missing_data_dir_yields_empty_index() -> Result<()> {
    let dir = tempdir()?;
    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(16));

    let outcome = retriever.build_or_load_index(false).await?;
    assert_eq!(outcome.chunks(), 0);
    assert!(matches!(
        retriever.query("anything", 1).await,
        Err(RetrieverError::IndexEmpty)
    ));
    Ok(())
}

#[tokio::test]
async fn test_faulty_files_are_reported_not_fatal() -> Result<()> {
    let dir = workspace(&[
        ("a.txt", "alpha beta gamma delta"),
        ("scan.pdf", "not a pdf at all"),
        ("slides.pptx", "ignored entirely"),
    ])?;
    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(16));

    match retriever.build_or_load_index(false).await? {
        BuildOutcome::Built {
            chunks,
            documents,
            faults,
        } => {
            assert_eq!(chunks, 2);
            assert_eq!(documents, 1);
            assert_eq!(faults.len(), 1);
            assert!(faults[0].path.ends_with("scan.pdf"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_max_chunks_caps_the_index() -> Result<()> {
    let dir = workspace(&[("a.txt", "one two three four five six seven eight")])?;
    let base = config(dir.path(), 2, 0);
    let capped = RetrieverConfig {
        chunking: base.chunking.with_max_chunks(3),
        ..base
    };
    let retriever = Retriever::new(capped, hashing(16));

    let outcome = retriever.build_or_load_index(false).await?;
    assert_eq!(outcome.chunks(), 3);
    Ok(())
}

#[tokio::test]
async fn test_default_chunking_indexes_every_chunk() -> Result<()> {
    let text = (0..300).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
    let dir = workspace(&[("a.txt", text.as_str())])?;
    let retriever = Retriever::new(config(dir.path(), 2, 0), hashing(1024));

    let outcome = retriever.build_or_load_index(false).await?;
    assert_eq!(outcome.chunks(), 150);

    let index = retriever.current_index().await.expect("index is active");
    let last = index.metadatas().last().expect("non-empty index");
    assert_eq!((last.chunk, last.text_preview.as_str()), (149, "w298 w299"));

    let hits = retriever.query("w298 w299", 1).await?;
    assert_eq!(hits[0].metadata.chunk, 149);
    Ok(())
}

#[tokio::test]
async fn test_raising_max_chunks_rebuilds_capped_index() -> Result<()> {
    let dir = workspace(&[("a.txt", "one two three four five six seven eight")])?;
    let base = config(dir.path(), 2, 0);
    let capped = RetrieverConfig {
        chunking: base.chunking.with_max_chunks(3),
        ..base.clone()
    };
    Retriever::new(capped, hashing(16))
        .build_or_load_index(false)
        .await?;

    let retriever = Retriever::new(base, hashing(16));
    let outcome = retriever.build_or_load_index(false).await?;
    assert!(matches!(outcome, BuildOutcome::Built { chunks: 4, .. }));

    let reloaded = FlatIndex::load(&dir.path().join("index")).await?;
    assert_eq!(reloaded.chunking().max_chunks, 0);
    Ok(())
}
