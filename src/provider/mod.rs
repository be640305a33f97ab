//! Model provider abstraction
//!
//! The engine delegates embedding and text generation to an external model
//! provider behind this trait. Backends are selected by name through
//! [`create`]; only the fastembed backend ships with the crate.

use std::sync::Arc;
use thiserror::Error;

use crate::config::EmbeddingConfig;
use crate::error::{DocdexError, Result};

mod fastembed;

pub use fastembed::FastEmbedProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Model initialization failed: {0}")]
    InitializationError(String),

    #[error("Embedding generation failed: {0}")]
    GenerationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Text generation is not supported by this provider: {0}")]
    GenerationUnsupported(String),
}

/// External model provider contract
///
/// Embedding powers the vector store; generation powers the optional query
/// preprocessor. A provider may support only one of the two.
pub trait ModelProvider: Send + Sync {
    /// Generate an embedding for a single text
    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;

    /// Generate embeddings for multiple texts (batched for efficiency)
    fn embed_batch(&self, texts: &[String]) -> std::result::Result<Vec<Vec<f32>>, ProviderError>;

    /// Generate text from a prompt
    fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;

    /// Embedding dimension
    fn dimension(&self) -> usize;

    /// Model name
    fn model_name(&self) -> &str;
}

/// Create a provider from configuration, selecting the backend by name.
///
/// Fails fast with a configuration error so a misconfigured engine never
/// reaches its first query.
pub fn create(config: &EmbeddingConfig) -> Result<Arc<dyn ModelProvider>> {
    match config.provider.as_str() {
        "fastembed" => {
            let provider = FastEmbedProvider::new(&config.model).map_err(|e| {
                DocdexError::Config(format!("Failed to initialize fastembed provider: {e}"))
            })?;
            Ok(Arc::new(provider))
        }
        other => Err(DocdexError::Config(format!(
            "Unknown model provider backend: {other:?} (supported: fastembed)"
        ))),
    }
}
