//! In-memory BM25 index over the chunk set
//!
//! Never persisted: the index is rebuilt from the current chunk set whenever
//! an engine is constructed, which keeps it consistent with the vector
//! store's contents by construction. Results carry chunk ordinals into rank
//! fusion.

use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Schema, Value, INDEXED, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, ReloadPolicy, TantivyError};
use thiserror::Error;

use crate::chunking::Chunk;

#[derive(Error, Debug)]
pub enum LexicalIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Insert failed: {0}")]
    InsertError(String),

    #[error("Search failed: {0}")]
    SearchError(String),

    #[error("Tantivy error: {0}")]
    Tantivy(#[from] TantivyError),
}

/// Term-frequency index supporting ranked keyword retrieval
pub struct LexicalIndex {
    index: Index,
    reader: IndexReader,
    ordinal_field: tantivy::schema::Field,
    content_field: tantivy::schema::Field,
    len: usize,
}

impl LexicalIndex {
    /// Build the index in RAM over the full chunk set.
    pub fn build(chunks: &[Chunk]) -> Result<Self, LexicalIndexError> {
        let mut schema_builder = Schema::builder();
        let ordinal_field = schema_builder.add_u64_field("ordinal", INDEXED | STORED);
        let content_field = schema_builder.add_text_field("content", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);

        let mut writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| LexicalIndexError::InitializationError(e.to_string()))?;

        for (ordinal, chunk) in chunks.iter().enumerate() {
            writer
                .add_document(doc!(
                    ordinal_field => ordinal as u64,
                    content_field => chunk.content.as_str(),
                ))
                .map_err(|e| LexicalIndexError::InsertError(e.to_string()))?;
        }

        writer
            .commit()
            .map_err(|e| LexicalIndexError::InsertError(e.to_string()))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e: TantivyError| LexicalIndexError::InitializationError(e.to_string()))?;
        reader
            .reload()
            .map_err(|e| LexicalIndexError::InitializationError(e.to_string()))?;

        tracing::debug!(chunks = chunks.len(), "Lexical index built");

        Ok(Self {
            index,
            reader,
            ordinal_field,
            content_field,
            len: chunks.len(),
        })
    }

    /// Rank chunks for a query, returning `(ordinal, bm25_score)` pairs.
    ///
    /// Queries are parsed leniently so arbitrary user text can never fail
    /// retrieval; unparsable fragments are dropped.
    pub fn rank(&self, query: &str, k: usize) -> Result<Vec<(usize, f32)>, LexicalIndexError> {
        if self.len == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        let (parsed, parse_errors) = parser.parse_query_lenient(query);
        if !parse_errors.is_empty() {
            tracing::debug!(?parse_errors, "Lenient query parse dropped fragments");
        }

        let top_docs = searcher
            .search(&parsed, &TopDocs::with_limit(k))
            .map_err(|e| LexicalIndexError::SearchError(e.to_string()))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: tantivy::TantivyDocument = searcher
                .doc(address)
                .map_err(|e| LexicalIndexError::SearchError(e.to_string()))?;
            let ordinal = stored
                .get_first(self.ordinal_field)
                .and_then(|v| v.as_u64())
                .ok_or_else(|| {
                    LexicalIndexError::SearchError("Missing ordinal field".to_string())
                })?;
            results.push((ordinal as usize, score));
        }

        Ok(results)
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::ChunkMetadata;

    fn chunk(content: &str) -> Chunk {
        Chunk {
            chunk_id: uuid::Uuid::new_v4().to_string(),
            content: content.to_string(),
            metadata: ChunkMetadata {
                title: "t".to_string(),
                source_url: "u".to_string(),
                file_path: "p".to_string(),
            },
        }
    }

    #[test]
    fn test_rank_relevance() {
        let chunks = vec![
            chunk("Configure the webhook endpoint before enabling notifications."),
            chunk("The quick brown fox jumps over the lazy dog."),
            chunk("Webhook payloads are signed with the shared secret."),
        ];
        let index = LexicalIndex::build(&chunks).unwrap();

        let results = index.rank("webhook", 10).unwrap();
        assert_eq!(results.len(), 2);
        let ordinals: Vec<usize> = results.iter().map(|(o, _)| *o).collect();
        assert!(ordinals.contains(&0));
        assert!(ordinals.contains(&2));
    }

    #[test]
    fn test_empty_chunk_set() {
        let index = LexicalIndex::build(&[]).unwrap();
        assert!(index.is_empty());
        let results = index.rank("anything", 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_lenient_parsing() {
        let chunks = vec![chunk("Authentication tokens expire after one hour.")];
        let index = LexicalIndex::build(&chunks).unwrap();
        // Unbalanced quotes would fail a strict parser.
        let results = index.rank("\"authentication tokens", 5).unwrap();
        assert!(!results.is_empty());
    }

    #[test]
    fn test_k_bounds_results() {
        let chunks: Vec<Chunk> = (0..10)
            .map(|i| chunk(&format!("shared term plus unique word{i}")))
            .collect();
        let index = LexicalIndex::build(&chunks).unwrap();
        let results = index.rank("shared term", 3).unwrap();
        assert_eq!(results.len(), 3);
    }
}
