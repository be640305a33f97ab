//! Configuration management for docdex
//!
//! TOML-backed configuration covering corpus ingestion, chunking, the
//! persistent vector store, the model provider, and retrieval parameters.

use crate::error::{DocdexError, Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub chunking: ChunkingConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
}

/// Corpus ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory holding scraped JSON records
    pub doc_dir: PathBuf,
    /// Only records with this metadata language participate
    pub language: String,
    /// Apply the document cleaner before chunking
    pub enable_cleaning: bool,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Soft maximum chunk length in characters
    pub chunk_size: usize,
    /// Shared content length between consecutive chunks of one document
    pub chunk_overlap: usize,
}

/// Persistent vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory under which collections are persisted
    pub persist_dir: PathBuf,
    /// Collection name within the persist directory
    pub collection: String,
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider backend selected by name
    pub provider: String,
    /// Embedding model name
    pub model: String,
}

/// LLM configuration for the optional query preprocessor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Rewrite queries through the model provider before retrieval
    pub enable_query_preprocessing: bool,
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Retrieval method selected once at engine construction
    pub method: RetrievalMethod,
    /// Number of chunks requested from each underlying index
    pub top_k_docs: usize,
    /// Rank fusion weight for the lexical list
    pub lexical_weight: f32,
    /// Rank fusion weight for the dense list
    pub dense_weight: f32,
    /// Reciprocal rank fusion constant
    pub rrf_k: f32,
}

/// Retrieval method variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMethod {
    /// Fused lexical + dense ranking
    Hybrid,
    /// Dense-only ranking
    Vanilla,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus: CorpusConfig {
                doc_dir: PathBuf::from("./docs"),
                language: "en".to_string(),
                enable_cleaning: true,
            },
            chunking: ChunkingConfig {
                chunk_size: 1000,
                chunk_overlap: 0,
            },
            store: StoreConfig {
                persist_dir: default_persist_dir(),
                collection: "default_collection".to_string(),
            },
            embedding: EmbeddingConfig {
                provider: "fastembed".to_string(),
                model: "all-MiniLM-L6-v2".to_string(),
            },
            llm: LlmConfig {
                enable_query_preprocessing: true,
            },
            retrieval: RetrievalConfig {
                method: RetrievalMethod::Hybrid,
                top_k_docs: 5,
                lexical_weight: 0.4,
                dense_weight: 0.6,
                rrf_k: 60.0,
            },
        }
    }
}

fn default_persist_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docdex")
        .join("store")
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(DocdexError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| DocdexError::Io {
            source: e,
            context: format!("Failed to read config file: {}", path.display()),
        })?;

        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| DocdexError::Io {
            source: e,
            context: format!("Failed to write config file: {}", path.display()),
        })
    }

    /// Default configuration file location
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DocdexError::Config("Cannot determine config directory".to_string()))?;
        Ok(config_dir.join("docdex").join("config.toml"))
    }

    /// Validate configuration values, collecting every failure
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.chunking.chunk_size == 0 {
            errors.push(ValidationError::new(
                "chunking.chunk_size",
                "must be greater than zero",
            ));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size.max(1) {
            errors.push(ValidationError::new(
                "chunking.chunk_overlap",
                "must be smaller than chunk_size",
            ));
        }
        if self.corpus.language.is_empty() {
            errors.push(ValidationError::new("corpus.language", "must not be empty"));
        }
        if self.embedding.provider.is_empty() {
            errors.push(ValidationError::new(
                "embedding.provider",
                "must name a provider backend",
            ));
        }
        if self.embedding.model.is_empty() {
            errors.push(ValidationError::new(
                "embedding.model",
                "must name an embedding model",
            ));
        }
        if self.retrieval.top_k_docs == 0 {
            errors.push(ValidationError::new(
                "retrieval.top_k_docs",
                "must be greater than zero",
            ));
        }
        if self.retrieval.lexical_weight <= 0.0 {
            errors.push(ValidationError::new(
                "retrieval.lexical_weight",
                "must be positive",
            ));
        }
        if self.retrieval.dense_weight <= 0.0 {
            errors.push(ValidationError::new(
                "retrieval.dense_weight",
                "must be positive",
            ));
        }
        if self.retrieval.rrf_k <= 0.0 {
            errors.push(ValidationError::new("retrieval.rrf_k", "must be positive"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DocdexError::ConfigValidation { errors })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.method, RetrievalMethod::Hybrid);
        assert_eq!(config.retrieval.top_k_docs, 5);
    }

    #[test]
    fn test_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.store.collection = "docs_v2".to_string();
        config.retrieval.method = RetrievalMethod::Vanilla;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.store.collection, "docs_v2");
        assert_eq!(loaded.retrieval.method, RetrievalMethod::Vanilla);
    }

    #[test]
    fn test_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(DocdexError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_validation_collects_errors() {
        let mut config = Config::default();
        config.chunking.chunk_size = 0;
        config.retrieval.dense_weight = -1.0;

        match config.validate() {
            Err(DocdexError::ConfigValidation { errors }) => {
                assert!(errors.len() >= 2);
            }
            other => panic!("expected validation failure, got {:?}", other.is_ok()),
        }
    }
}
