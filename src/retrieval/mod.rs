//! Retrieval surface
//!
//! Fuses lexical and dense rankings over one chunk set and reports
//! diagnostics alongside every result list.

mod engine;
mod fusion;
mod preprocess;

pub use engine::{Engine, HybridRetriever, Retriever, VanillaRetriever};
pub use fusion::{weighted_rank_fusion, FusionConfig, FusionError};
pub use preprocess::QueryPreprocessor;

use crate::chunking::Chunk;
use serde::Serialize;

/// One retrieved chunk with its relevance score
///
/// Scores are not comparable across retrieval methods: lexical BM25 scores
/// and cosine-derived scores live on different scales, and fused scores on a
/// third.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Ordered retrieval outcome
pub type RetrievalResult = Vec<ScoredChunk>;

/// Side information about how a query was answered
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalDiagnostics {
    pub original_query: String,
    pub preprocessing_applied: bool,
    pub improved_query: Option<String>,
    pub total_retrieved: usize,
}
