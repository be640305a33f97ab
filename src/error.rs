use std::path::PathBuf;
use thiserror::Error;

use crate::index::{LexicalIndexError, VectorStoreError};
use crate::provider::ProviderError;

/// Main error type for the docdex engine
#[derive(Error, Debug)]
pub enum DocdexError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Corpus file with an unrecognized format; ingestion is all-or-nothing
    #[error("Unsupported corpus file format: {path} (only JSON records are supported)")]
    UnsupportedFormat { path: PathBuf },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// Model provider errors
    #[error("Model provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Lexical index errors
    #[error("Lexical index error: {0}")]
    Lexical(#[from] LexicalIndexError),

    /// Vector store errors
    #[error("Vector store error: {0}")]
    Store(#[from] VectorStoreError),

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for docdex operations
pub type Result<T> = std::result::Result<T, DocdexError>;
