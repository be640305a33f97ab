//! Persistent vector store
//!
//! A collection lives under `persist_dir/<collection>/` as an entries file
//! (one `(id, content, metadata, embedding)` tuple per chunk) and a manifest
//! file whose presence is the "already built" marker. Search goes through an
//! in-memory HNSW rebuilt from the entries; cosine distance is converted to
//! a similarity score as `1.0 - distance`.

use hnsw_rs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::chunking::{Chunk, ChunkMetadata};
use crate::provider::{ModelProvider, ProviderError};

/// Marker file: its presence means the collection is already built
const MANIFEST_FILE: &str = "manifest.json";
const ENTRIES_FILE: &str = "entries.json";

const HNSW_M: usize = 16;
const HNSW_MAX_LAYER: usize = 16;
const HNSW_EF_CONSTRUCTION: usize = 200;
const HNSW_EF_SEARCH: usize = 50;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] ProviderError),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Corrupt collection: {0}")]
    Corrupt(String),
}

/// Persisted representation of a chunk inside the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    collection: String,
    model: String,
    dimension: usize,
    entries: usize,
    created_at: String,
}

/// On-disk dense index with load-or-build semantics
///
/// Concurrent builders targeting the same collection race; callers must
/// serialize builds on one persist directory.
pub struct VectorStore {
    provider: Arc<dyn ModelProvider>,
    entries: Vec<IndexEntry>,
    ann: Hnsw<'static, f32, DistCosine>,
    dimension: usize,
    collection_dir: PathBuf,
    loaded_from_disk: bool,
}

impl VectorStore {
    /// Load the collection if its marker exists, otherwise embed and persist
    /// `chunks_if_building`.
    pub fn open_or_build(
        provider: Arc<dyn ModelProvider>,
        persist_dir: &Path,
        collection: &str,
        chunks_if_building: &[Chunk],
    ) -> Result<Self, VectorStoreError> {
        let collection_dir = persist_dir.join(collection);
        if collection_dir.join(MANIFEST_FILE).exists() {
            Self::load(provider, collection_dir)
        } else {
            Self::build(provider, collection_dir, collection, chunks_if_building)
        }
    }

    fn load(
        provider: Arc<dyn ModelProvider>,
        collection_dir: PathBuf,
    ) -> Result<Self, VectorStoreError> {
        tracing::info!(dir = %collection_dir.display(), "Loading existing vector store");

        let manifest: Manifest = read_json(&collection_dir.join(MANIFEST_FILE))?;
        if manifest.model != provider.model_name() {
            tracing::warn!(
                stored = %manifest.model,
                configured = %provider.model_name(),
                "Embedding model differs from the one this collection was built with"
            );
        }

        let entries: Vec<IndexEntry> = read_json(&collection_dir.join(ENTRIES_FILE))?;
        if entries.len() != manifest.entries {
            return Err(VectorStoreError::Corrupt(format!(
                "manifest records {} entries, file holds {}",
                manifest.entries,
                entries.len()
            )));
        }
        for entry in &entries {
            if entry.embedding.len() != manifest.dimension {
                return Err(VectorStoreError::InvalidDimension {
                    expected: manifest.dimension,
                    actual: entry.embedding.len(),
                });
            }
        }

        let ann = build_ann(&entries);

        tracing::info!(entries = entries.len(), "Vector store loaded without re-embedding");

        Ok(Self {
            provider,
            entries,
            ann,
            dimension: manifest.dimension,
            collection_dir,
            loaded_from_disk: true,
        })
    }

    fn build(
        provider: Arc<dyn ModelProvider>,
        collection_dir: PathBuf,
        collection: &str,
        chunks: &[Chunk],
    ) -> Result<Self, VectorStoreError> {
        tracing::info!(
            dir = %collection_dir.display(),
            chunks = chunks.len(),
            "Building new vector store"
        );

        std::fs::create_dir_all(&collection_dir).map_err(|e| VectorStoreError::Io {
            source: e,
            context: format!("Failed to create collection dir: {}", collection_dir.display()),
        })?;

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            provider.embed_batch(&texts)?
        };

        let entries: Vec<IndexEntry> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry {
                id: chunk.chunk_id.clone(),
                content: chunk.content.clone(),
                metadata: chunk.metadata.clone(),
                embedding,
            })
            .collect();

        // Entries first, marker last: a partial write never looks built.
        write_json(&collection_dir.join(ENTRIES_FILE), &entries)?;
        let manifest = Manifest {
            collection: collection.to_string(),
            model: provider.model_name().to_string(),
            dimension: provider.dimension(),
            entries: entries.len(),
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        write_json(&collection_dir.join(MANIFEST_FILE), &manifest)?;

        let ann = build_ann(&entries);

        Ok(Self {
            provider,
            entries,
            ann,
            dimension: manifest.dimension,
            collection_dir,
            loaded_from_disk: false,
        })
    }

    /// Whether a built collection already exists under `persist_dir`.
    pub fn exists(persist_dir: &Path, collection: &str) -> bool {
        persist_dir.join(collection).join(MANIFEST_FILE).exists()
    }

    /// Hydrate one chunk per stored id, in stored order.
    ///
    /// Linear by design; this is what keeps the lexical index consistent with
    /// the store after a load.
    pub fn chunks(&self) -> Vec<Chunk> {
        self.entries
            .iter()
            .map(|entry| Chunk {
                chunk_id: entry.id.clone(),
                content: entry.content.clone(),
                metadata: entry.metadata.clone(),
            })
            .collect()
    }

    /// K nearest chunks by vector distance, as `(ordinal, score)` pairs.
    pub fn search_ordinals(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(usize, f32)>, VectorStoreError> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.provider.embed(query)?;
        if embedding.len() != self.dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }

        let neighbours = self.ann.search(&embedding, k, HNSW_EF_SEARCH);
        let mut results: Vec<(usize, f32)> = neighbours
            .into_iter()
            .map(|n| (n.d_id, 1.0 - n.distance))
            .collect();
        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(results)
    }

    /// K nearest chunks by vector distance, hydrated with scores.
    pub fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Chunk, f32)>, VectorStoreError> {
        let ordinals = self.search_ordinals(query, k)?;
        Ok(ordinals
            .into_iter()
            .filter_map(|(ordinal, score)| {
                self.entries.get(ordinal).map(|entry| {
                    (
                        Chunk {
                            chunk_id: entry.id.clone(),
                            content: entry.content.clone(),
                            metadata: entry.metadata.clone(),
                        },
                        score,
                    )
                })
            })
            .collect())
    }

    /// Whether this store was loaded from disk (as opposed to freshly built)
    pub fn was_loaded(&self) -> bool {
        self.loaded_from_disk
    }

    /// Number of persisted entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Collection directory on disk
    pub fn collection_dir(&self) -> &Path {
        &self.collection_dir
    }
}

fn build_ann(entries: &[IndexEntry]) -> Hnsw<'static, f32, DistCosine> {
    let ann = Hnsw::<f32, DistCosine>::new(
        HNSW_M,
        entries.len().max(HNSW_M),
        HNSW_MAX_LAYER,
        HNSW_EF_CONSTRUCTION,
        DistCosine,
    );
    for (ordinal, entry) in entries.iter().enumerate() {
        ann.insert((&entry.embedding, ordinal));
    }
    ann
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, VectorStoreError> {
    let raw = std::fs::read_to_string(path).map_err(|e| VectorStoreError::Io {
        source: e,
        context: format!("Failed to read {}", path.display()),
    })?;
    serde_json::from_str(&raw).map_err(|e| VectorStoreError::Json {
        source: e,
        context: format!("Failed to parse {}", path.display()),
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), VectorStoreError> {
    let raw = serde_json::to_string_pretty(value).map_err(|e| VectorStoreError::Json {
        source: e,
        context: format!("Failed to serialize {}", path.display()),
    })?;
    std::fs::write(path, raw).map_err(|e| VectorStoreError::Io {
        source: e,
        context: format!("Failed to write {}", path.display()),
    })
}
