//! Load-or-build persistence tests for the vector store
mod common;

use std::sync::Arc;

use tempfile::TempDir;

use common::{write_fixture_corpus, write_record, MockProvider};
use docdex::chunking::{Chunk, ChunkMetadata};
use docdex::config::Config;
use docdex::index::{VectorStore, VectorStoreError};
use docdex::retrieval::Engine;

fn make_chunks(n: usize) -> Vec<Chunk> {
    (0..n)
        .map(|i| Chunk {
            chunk_id: uuid::Uuid::new_v4().to_string(),
            content: format!("Persistent chunk number {i} with a little body text."),
            metadata: ChunkMetadata {
                title: format!("Title {i}"),
                source_url: format!("https://docs.example.com/page-{i}"),
                file_path: format!("docs/page-{i}.json"),
            },
        })
        .collect()
}

#[test]
fn test_build_writes_marker_and_entries() {
    let persist = TempDir::new().unwrap();
    let provider = Arc::new(MockProvider::new());

    let store =
        VectorStore::open_or_build(provider, persist.path(), "col", &make_chunks(2)).unwrap();

    assert!(!store.was_loaded());
    assert_eq!(store.len(), 2);
    let dir = persist.path().join("col");
    assert!(dir.join("manifest.json").exists());
    assert!(dir.join("entries.json").exists());
}

#[test]
fn test_reopen_hydrates_without_reembedding() {
    let persist = TempDir::new().unwrap();
    let provider = Arc::new(MockProvider::new());
    let chunks = make_chunks(3);

    let built = VectorStore::open_or_build(
        provider.clone(),
        persist.path(),
        "col",
        &chunks,
    )
    .unwrap();
    let built_ids: Vec<String> = built.chunks().iter().map(|c| c.chunk_id.clone()).collect();
    let calls_after_build = provider.embed_calls();
    assert_eq!(calls_after_build, 3);
    drop(built);

    // Reopen ignores the chunk argument entirely.
    let reopened =
        VectorStore::open_or_build(provider.clone(), persist.path(), "col", &[]).unwrap();

    assert!(reopened.was_loaded());
    assert_eq!(provider.embed_calls(), calls_after_build);

    // Hydration preserves ids, contents, and order.
    let reopened_chunks = reopened.chunks();
    let reopened_ids: Vec<String> = reopened_chunks.iter().map(|c| c.chunk_id.clone()).collect();
    assert_eq!(reopened_ids, built_ids);
    assert_eq!(reopened_chunks[0].metadata.title, "Title 0");
}

#[test]
fn test_reopened_store_searches() {
    let persist = TempDir::new().unwrap();
    let provider = Arc::new(MockProvider::new());

    VectorStore::open_or_build(provider.clone(), persist.path(), "col", &make_chunks(3)).unwrap();
    let reopened = VectorStore::open_or_build(provider, persist.path(), "col", &[]).unwrap();

    let hits = reopened.similarity_search("persistent chunk number 1", 2).unwrap();
    assert!(!hits.is_empty());
    assert!(hits.len() <= 2);
}

#[test]
fn test_empty_build_persists() {
    let persist = TempDir::new().unwrap();
    let provider = Arc::new(MockProvider::new());

    let store = VectorStore::open_or_build(provider.clone(), persist.path(), "col", &[]).unwrap();
    assert!(store.is_empty());
    assert!(store.search_ordinals("anything", 5).unwrap().is_empty());
    drop(store);

    let reopened = VectorStore::open_or_build(provider, persist.path(), "col", &[]).unwrap();
    assert!(reopened.was_loaded());
    assert!(reopened.is_empty());
}

#[test]
fn test_entry_count_mismatch_is_corrupt() {
    let persist = TempDir::new().unwrap();
    let provider = Arc::new(MockProvider::new());

    VectorStore::open_or_build(provider.clone(), persist.path(), "col", &make_chunks(2)).unwrap();

    // Drop one entry behind the manifest's back.
    let entries_path = persist.path().join("col").join("entries.json");
    let raw = std::fs::read_to_string(&entries_path).unwrap();
    let mut entries: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    entries.pop();
    std::fs::write(&entries_path, serde_json::to_string(&entries).unwrap()).unwrap();

    let result = VectorStore::open_or_build(provider, persist.path(), "col", &[]);
    assert!(matches!(result, Err(VectorStoreError::Corrupt(_))));
}

#[test]
fn test_engine_reopen_skips_corpus() {
    let corpus = TempDir::new().unwrap();
    let persist = TempDir::new().unwrap();
    write_fixture_corpus(corpus.path());

    let mut config = Config::default();
    config.corpus.doc_dir = corpus.path().to_path_buf();
    config.store.persist_dir = persist.path().to_path_buf();
    config.store.collection = "docs".to_string();
    config.llm.enable_query_preprocessing = false;

    let provider = Arc::new(MockProvider::new());
    let engine = Engine::open(config.clone(), provider.clone()).unwrap();
    let chunk_count = engine.chunk_count();
    assert!(engine.load_stats().is_some());
    engine.close();

    // A stray non-JSON file would abort any fresh corpus load.
    std::fs::write(corpus.path().join("stray.txt"), "not a record").unwrap();

    let calls_before = provider.embed_calls();
    let reopened = Engine::open(config, provider.clone()).unwrap();
    assert_eq!(reopened.chunk_count(), chunk_count);
    assert!(reopened.load_stats().is_none());
    assert_eq!(provider.embed_calls(), calls_before);
}

#[test]
fn test_collections_are_isolated() {
    let corpus_a = TempDir::new().unwrap();
    let corpus_b = TempDir::new().unwrap();
    let persist = TempDir::new().unwrap();
    write_fixture_corpus(corpus_a.path());
    write_record(
        corpus_b.path(),
        "solo",
        "en",
        "Solo page",
        "A single page corpus with just enough body text to clear the minimum \
         chunk length and produce exactly one retrievable chunk.",
    );

    let provider = Arc::new(MockProvider::new());

    let mut config_a = Config::default();
    config_a.corpus.doc_dir = corpus_a.path().to_path_buf();
    config_a.store.persist_dir = persist.path().to_path_buf();
    config_a.store.collection = "alpha".to_string();
    config_a.llm.enable_query_preprocessing = false;

    let mut config_b = config_a.clone();
    config_b.corpus.doc_dir = corpus_b.path().to_path_buf();
    config_b.store.collection = "beta".to_string();

    let engine_a = Engine::open(config_a, provider.clone()).unwrap();
    let engine_b = Engine::open(config_b, provider).unwrap();

    assert_eq!(engine_a.chunk_count(), 3);
    assert_eq!(engine_b.chunk_count(), 1);
}
