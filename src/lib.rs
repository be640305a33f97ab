//! Docdex - Hybrid Documentation Retrieval Engine
//!
//! Ingests scraped documentation records, cleans and chunks them, indexes the
//! chunks both lexically (BM25) and densely (embeddings), and answers
//! free-text queries with a fused ranking so a downstream step can propose
//! edits to stale documentation.

pub mod chunking;
pub mod cleaning;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod provider;
pub mod retrieval;

pub use error::{DocdexError, Result};
