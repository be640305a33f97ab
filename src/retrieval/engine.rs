//! Retrieval engine
//!
//! Owns the chunk set, both indexes, and the optional query preprocessor.
//! Construction follows load-or-build: an existing collection is hydrated
//! from disk without touching the corpus directory, otherwise the corpus is
//! loaded, chunked, embedded, and persisted. The retrieval method is fixed
//! when the engine is opened.

use std::sync::Arc;

use crate::chunking::{split_documents, Chunk};
use crate::config::{Config, RetrievalMethod};
use crate::corpus::{CorpusLoader, LoadStats};
use crate::error::{DocdexError, Result};
use crate::index::{LexicalIndex, VectorStore};
use crate::provider::{self, ModelProvider};
use crate::retrieval::fusion::{weighted_rank_fusion, FusionConfig};
use crate::retrieval::preprocess::QueryPreprocessor;
use crate::retrieval::{RetrievalDiagnostics, RetrievalResult, ScoredChunk};

/// Retrieval strategy, fixed at engine construction
pub enum Retriever {
    /// Lexical and dense rankings fused by weighted reciprocal rank
    Hybrid(HybridRetriever),
    /// Dense-only similarity search
    Vanilla(VanillaRetriever),
}

impl Retriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        match self {
            Retriever::Hybrid(r) => r.retrieve(query, k),
            Retriever::Vanilla(r) => r.retrieve(query, k),
        }
    }
}

pub struct HybridRetriever {
    store: VectorStore,
    lexical: LexicalIndex,
    chunks: Arc<Vec<Chunk>>,
    fusion: FusionConfig,
}

impl HybridRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        // Each source list is bounded by k; the fused list is not truncated.
        let lexical_hits = self.lexical.rank(query, k)?;
        let dense_hits = self.store.search_ordinals(query, k)?;
        tracing::debug!(
            lexical = lexical_hits.len(),
            dense = dense_hits.len(),
            "Fusing ranked lists"
        );

        let fused = weighted_rank_fusion(&lexical_hits, &dense_hits, &self.fusion);
        Ok(fused
            .into_iter()
            .filter_map(|(ordinal, score)| {
                self.chunks
                    .get(ordinal)
                    .map(|chunk| ScoredChunk {
                        chunk: chunk.clone(),
                        score,
                    })
            })
            .collect())
    }
}

pub struct VanillaRetriever {
    store: VectorStore,
}

impl VanillaRetriever {
    fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let hits = self.store.similarity_search(query, k)?;
        Ok(hits
            .into_iter()
            .map(|(chunk, score)| ScoredChunk { chunk, score })
            .collect())
    }
}

/// Single-owner retrieval engine
pub struct Engine {
    retriever: Retriever,
    preprocessor: Option<QueryPreprocessor>,
    chunks: Arc<Vec<Chunk>>,
    load_stats: Option<LoadStats>,
}

impl Engine {
    /// Open an engine, creating the model provider from the configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = provider::create(&config.embedding)?;
        Self::open(config, provider)
    }

    /// Open an engine with an explicit model provider.
    ///
    /// When the configured collection already exists on disk the corpus
    /// directory is not read and nothing is re-embedded; the chunk set is
    /// hydrated from the stored entries.
    pub fn open(config: Config, provider: Arc<dyn ModelProvider>) -> Result<Self> {
        config.validate()?;

        let (store, chunks, load_stats) =
            if VectorStore::exists(&config.store.persist_dir, &config.store.collection) {
                let store = VectorStore::open_or_build(
                    provider.clone(),
                    &config.store.persist_dir,
                    &config.store.collection,
                    &[],
                )?;
                let chunks = store.chunks();
                (store, chunks, None)
            } else {
                let loader =
                    CorpusLoader::new(&config.corpus.language, config.corpus.enable_cleaning);
                let (documents, stats) = loader.load(&config.corpus.doc_dir)?;
                let chunks = split_documents(
                    &documents,
                    config.chunking.chunk_size,
                    config.chunking.chunk_overlap,
                );
                let store = VectorStore::open_or_build(
                    provider.clone(),
                    &config.store.persist_dir,
                    &config.store.collection,
                    &chunks,
                )?;
                (store, chunks, Some(stats))
            };

        let chunks = Arc::new(chunks);

        let retriever = match config.retrieval.method {
            RetrievalMethod::Hybrid => {
                let lexical = LexicalIndex::build(&chunks)?;
                let fusion = FusionConfig::new(
                    config.retrieval.rrf_k,
                    config.retrieval.lexical_weight,
                    config.retrieval.dense_weight,
                )
                .map_err(|e| DocdexError::Config(e.to_string()))?;
                Retriever::Hybrid(HybridRetriever {
                    store,
                    lexical,
                    chunks: Arc::clone(&chunks),
                    fusion,
                })
            }
            RetrievalMethod::Vanilla => Retriever::Vanilla(VanillaRetriever { store }),
        };

        let preprocessor = config
            .llm
            .enable_query_preprocessing
            .then(|| QueryPreprocessor::new(provider));

        tracing::info!(
            chunks = chunks.len(),
            method = ?config.retrieval.method,
            "Engine ready"
        );

        Ok(Self {
            retriever,
            preprocessor,
            chunks,
            load_stats,
        })
    }

    /// Retrieve up to `k` chunks per underlying index for `query`.
    ///
    /// `use_preprocessing` only takes effect when preprocessing was enabled
    /// in the configuration. The diagnostics record the rewrite even when it
    /// fell back to the original text.
    pub fn retrieve(
        &self,
        query: &str,
        k: usize,
        use_preprocessing: bool,
    ) -> Result<(RetrievalResult, RetrievalDiagnostics)> {
        let mut diagnostics = RetrievalDiagnostics {
            original_query: query.to_string(),
            preprocessing_applied: false,
            improved_query: None,
            total_retrieved: 0,
        };

        let effective_query = match (&self.preprocessor, use_preprocessing) {
            (Some(preprocessor), true) => {
                let improved = preprocessor.improve(query);
                diagnostics.preprocessing_applied = true;
                diagnostics.improved_query = Some(improved.clone());
                improved
            }
            _ => query.to_string(),
        };

        if self.chunks.is_empty() {
            return Ok((Vec::new(), diagnostics));
        }

        let results = self.retriever.retrieve(&effective_query, k)?;
        diagnostics.total_retrieved = results.len();

        Ok((results, diagnostics))
    }

    /// Number of chunks the engine retrieves over
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Corpus load statistics, present only when this open built the store
    pub fn load_stats(&self) -> Option<&LoadStats> {
        self.load_stats.as_ref()
    }

    /// Release the engine and everything it owns.
    pub fn close(self) {
        tracing::debug!("Engine closed");
        drop(self);
    }
}
