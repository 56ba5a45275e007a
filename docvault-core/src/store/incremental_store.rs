//! Optimized persistent store variant with explicit change detection.
//!
//! On top of the SQLite chunk table this variant keeps a per-file state
//! table (hash, size, mtime, last-checked). Reindex requests for unchanged
//! content short-circuit on a single primary-key lookup, and batch change
//! checks can skip hashing entirely when size and mtime still match.

use super::change::{self, content_hash, ChangeDetector, FsChangeDetector};
use super::chunk_db::ChunkDb;
use super::chunker::chunk_text;
use super::embedder::Embedder;
use super::similarity;
use super::types::{assemble_chunks, FileMetadata, RagQuery, SearchResult};
use super::vector_store::VectorStore;
use super::Result;
use crate::config::Config;
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// SQLite-backed vector store with a file-state side table.
pub struct IncrementalStore {
    db: ChunkDb,
    embedder: Embedder,
    chunk_size: usize,
    chunk_overlap: usize,
    detector: FsChangeDetector,
}

impl IncrementalStore {
    pub fn open(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        info!(
            "Opening incremental vector store at {}",
            path.as_ref().display()
        );
        Ok(Self {
            db: ChunkDb::open(path)?,
            embedder: Embedder::new(provider),
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            detector: FsChangeDetector,
        })
    }

    #[cfg(test)]
    pub(crate) fn in_memory_db(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            db: ChunkDb::in_memory().expect("in-memory database"),
            embedder: Embedder::new(provider),
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            detector: FsChangeDetector,
        }
    }

    /// File state to record alongside a fresh index of `source_file`.
    ///
    /// Size and mtime come from disk when the source is a readable file,
    /// letting later batch checks skip hashing; virtual sources (URIs,
    /// extracted documents) fall back to hash-only state.
    async fn state_for(&self, source_file: &str, content: &str, hash: &str) -> FileMetadata {
        let (size, last_modified) = match FsChangeDetector::probe(source_file).await {
            Some((size, modified)) => (size, Some(modified)),
            None => (content.len() as u64, None),
        };
        FileMetadata {
            file_path: source_file.to_string(),
            hash: hash.to_string(),
            size,
            last_modified,
            last_checked: Utc::now(),
        }
    }
}

#[async_trait]
impl VectorStore for IncrementalStore {
    async fn index_document(
        &self,
        source_file: &str,
        content: &str,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<()> {
        if content.trim().is_empty() {
            debug!("Nothing to index for {source_file}");
            return Ok(());
        }

        let hash = content_hash(content);
        if let Some(state) = self.db.file_state(source_file)? {
            if state.hash == hash {
                debug!("{source_file} unchanged, refreshing last_checked");
                self.db.touch_checked(source_file)?;
                return Ok(());
            }
        }

        let pieces = chunk_text(content, self.chunk_size, self.chunk_overlap);
        if pieces.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_many(&pieces).await?;
        let rows = assemble_chunks(source_file, pieces, embeddings, metadata, &hash);
        let state = self.state_for(source_file, content, &hash).await;

        debug!("Replacing {} chunks for {source_file}", rows.len());
        self.db.replace_file(source_file, &rows, Some(&state))
    }

    async fn search(&self, query: &RagQuery) -> Result<Vec<SearchResult>> {
        let query_embedding = match self.embedder.embed(&query.query).await {
            Ok(embedding) => embedding,
            Err(error) => {
                warn!("Query embedding failed, returning no results: {error}");
                return Ok(Vec::new());
            }
        };

        let candidates = self.db.load_chunks(&query.file_filters)?;
        similarity::rank(
            &query_embedding,
            candidates,
            query.min_similarity,
            query.top_k,
        )
    }

    async fn chunk_count(&self) -> usize {
        self.db.count().unwrap_or_else(|error| {
            warn!("Chunk count unavailable, reporting 0: {error}");
            0
        })
    }

    async fn indexed_files(&self) -> Vec<String> {
        self.db.list_source_files().unwrap_or_else(|error| {
            warn!("Indexed file list unavailable, reporting none: {error}");
            Vec::new()
        })
    }

    async fn remove_document(&self, source_file: &str) -> Result<()> {
        self.db.delete_file(source_file)
    }

    async fn clear_index(&self) -> Result<()> {
        info!("Clearing vector store");
        self.db.clear_all()
    }

    async fn batch_check_files_for_changes(
        &self,
        paths: &[String],
    ) -> Result<HashMap<String, bool>> {
        let known = self.db.file_states(paths)?;
        let verdicts = self.detector.batch_check(paths, &known).await;
        Ok(change::resolve_batch(verdicts))
    }
}
