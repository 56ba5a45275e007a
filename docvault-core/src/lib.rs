//! docvault-core - Document vector store engine
//!
//! Provides the foundational components for semantic document retrieval:
//! - Embedding provider abstraction (bring your own model backend)
//! - Chunking, change detection, and incremental indexing
//! - Embedded SQLite persistence with atomic per-file replace
//! - Exact cosine-similarity search
//!
//! ## Primary API
//!
//! Construct a store via [`create_vector_store`] and interact with it
//! through the [`VectorStore`] trait.

// Public modules
pub mod config;
pub mod provider;
pub mod store;

// Public exports
pub use config::{ChunkingConfig, Config, SearchConfig, StorageMode};
pub use store::{
    create_vector_store, ChangeDetector, DocumentChunk, FileMetadata, FsChangeDetector,
    IncrementalStore, MemoryStore, RagQuery, SearchResult, SqliteStore, StoreError, VectorStore,
};

// Provider exports
pub use provider::{EmbeddingProvider, ProviderError};
