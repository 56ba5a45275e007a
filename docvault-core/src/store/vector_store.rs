//! Vector store contract and factory.
//!
//! This module provides the unified interface all store variants implement
//! and the config-driven factory that selects one.

use super::incremental_store::IncrementalStore;
use super::memory_store::MemoryStore;
use super::sqlite_store::SqliteStore;
use super::types::{RagQuery, SearchResult};
use super::Result;
use crate::config::{Config, StorageMode};
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Unified interface for document vector stores.
///
/// All operations are safe to invoke concurrently; mutations to one source
/// file are atomic (replace-or-nothing), and readers observe the last
/// committed state.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Index (or reindex) one document.
    ///
    /// Empty or whitespace-only content is a no-op success. Content whose
    /// hash matches the stored state returns without a single embedding
    /// call. An embedding or storage failure propagates and leaves the
    /// file's previously persisted chunks untouched.
    async fn index_document(
        &self,
        source_file: &str,
        content: &str,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<()>;

    /// Rank stored chunks against the query.
    ///
    /// Results are sorted by descending cosine similarity, filtered by the
    /// query's inclusive `min_similarity` bound, and truncated to `top_k`.
    /// A failing embedding provider degrades to an empty result list so
    /// search stays available; an empty store returns an empty list.
    async fn search(&self, query: &RagQuery) -> Result<Vec<SearchResult>>;

    /// Total number of stored chunks. Degrades to 0 on storage errors.
    async fn chunk_count(&self) -> usize;

    /// Source files currently indexed. Degrades to empty on storage errors.
    async fn indexed_files(&self) -> Vec<String>;

    /// Drop one document's chunks (and any recorded file state).
    async fn remove_document(&self, source_file: &str) -> Result<()>;

    /// Remove all chunks unconditionally.
    async fn clear_index(&self) -> Result<()>;

    /// Decide which of `paths` need reindexing, in one call.
    ///
    /// Files that cannot be checked (I/O errors) are reported as changed so
    /// a bulk reindexer never silently skips them.
    async fn batch_check_files_for_changes(
        &self,
        paths: &[String],
    ) -> Result<HashMap<String, bool>>;
}

/// Creates a vector store instance based on the configured storage mode.
///
/// - `memory` keeps everything in-process, nothing survives a restart
/// - `embedded` persists to a SQLite file
/// - `incremental` persists to a SQLite file and tracks per-file state for
///   cheap change detection
pub fn create_vector_store(
    config: &Config,
    provider: Arc<dyn EmbeddingProvider>,
) -> Result<Arc<dyn VectorStore>> {
    match &config.storage {
        StorageMode::Memory => Ok(Arc::new(MemoryStore::new(config, provider))),
        StorageMode::Embedded { path } => {
            Ok(Arc::new(SqliteStore::open(config, provider, path)?))
        }
        StorageMode::Incremental { path } => {
            Ok(Arc::new(IncrementalStore::open(config, provider, path)?))
        }
    }
}
