//! Retrieval indexes
//!
//! The lexical index is in-memory only and rebuilt from the chunk set at
//! engine construction; the vector store persists its entries on disk and
//! follows load-or-build semantics keyed by a collection name.

pub mod lexical;
pub mod vector;

pub use lexical::{LexicalIndex, LexicalIndexError};
pub use vector::{IndexEntry, VectorStore, VectorStoreError};
