//! Document vector store.
//!
//! This module implements the full pipeline for semantic document retrieval.
//!
//! # Overview
//!
//! 1. **Indexing phase**:
//!    - Change detection decides whether a document actually needs work;
//!      unchanged content short-circuits before any embedding call
//!    - Documents are split into overlapping chunks
//!    - Each chunk is embedded via the configured [`EmbeddingProvider`]
//!    - The file's chunk set is replaced atomically in storage
//!
//! 2. **Retrieval phase**:
//!    - The query text is embedded
//!    - Candidate chunks are loaded (optionally pre-filtered by source file)
//!    - Exact cosine similarity ranks them; threshold and top-k apply
//!
//! # Store variants
//!
//! Three interchangeable [`VectorStore`] implementations are selected by
//! [`StorageMode`](crate::config::StorageMode):
//!
//! - [`MemoryStore`]: volatile, in-process
//! - [`SqliteStore`]: embedded SQLite file
//! - [`IncrementalStore`]: embedded SQLite file plus a per-file state table
//!   for cheap change detection and batch checks
//!
//! All variants are safe to share across tasks; writes to one source file
//! are atomic per the backing engine's transaction.
//!
//! [`EmbeddingProvider`]: crate::provider::EmbeddingProvider

mod change;
mod chunk_db;
mod chunker;
mod embedder;
mod incremental_store;
mod memory_store;
mod similarity;
mod sqlite_store;
#[cfg(test)]
pub(crate) mod test_support;
mod types;
mod vector_store;

pub use change::{content_hash, ChangeDetector, ChangeError, FsChangeDetector};
pub use embedder::{Embedder, EmbedderError};
pub use incremental_store::IncrementalStore;
pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;
pub use types::{DocumentChunk, FileMetadata, RagQuery, SearchResult};
pub use vector_store::{create_vector_store, VectorStore};

use thiserror::Error;

/// Errors surfaced by store operations.
///
/// Read-only introspection (`chunk_count`, `indexed_files`) never returns
/// these; it degrades to zero/empty instead. Writes always propagate them.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Change detection failed: {0}")]
    ChangeDetection(#[from] ChangeError),

    #[error("Embedding dimension mismatch: query has {query}, stored chunk has {stored}")]
    DimensionMismatch { query: usize, stored: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection lock poisoned")]
    Lock,
}

pub type Result<T> = std::result::Result<T, StoreError>;
