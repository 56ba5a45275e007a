//! Basic persistent store variant.
//!
//! Chunks live in an embedded SQLite file; reindex decisions compare the
//! incoming content hash against the hash stored on the file's chunk rows.

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

/// SQLite-backed vector store.
///
/// The backing file is created lazily on first open and survives process
/// restarts. Replacing a file's chunks is a single transaction, so readers
/// never observe a partially reindexed file.
pub struct SqliteStore {
    db: ChunkDb,
    embedder: Embedder,
    chunk_size: usize,
    chunk_overlap: usize,
    detector: FsChangeDetector,
}

impl SqliteStore {
    pub fn open(
        config: &Config,
        provider: Arc<dyn EmbeddingProvider>,
        path: impl AsRef<Path>,
    ) -> Result<Self> {
        info!("Opening vector store at {}", path.as_ref().display());
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
}

#[async_trait]
impl VectorStore for SqliteStore {
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
        if self.db.file_hash(source_file)?.as_deref() == Some(hash.as_str()) {
            debug!("{source_file} unchanged, skipping reindex");
            return Ok(());
        }

        let pieces = chunk_text(content, self.chunk_size, self.chunk_overlap);
        if pieces.is_empty() {
            return Ok(());
        }

        // Embeddings are gathered before the write transaction begins, so a
        // provider failure (or a dropped future) leaves prior chunks intact.
        let embeddings = self.embedder.embed_many(&pieces).await?;
        let rows = assemble_chunks(source_file, pieces, embeddings, metadata, &hash);

        debug!("Replacing {} chunks for {source_file}", rows.len());
        self.db.replace_file(source_file, &rows, None)
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
        let mut known = HashMap::new();
        for path in paths {
            if let Some(hash) = self.db.file_hash(path)? {
                known.insert(
                    path.clone(),
                    FileMetadata {
                        file_path: path.clone(),
                        hash,
                        size: 0,
                        last_modified: None,
                        last_checked: Utc::now(),
                    },
                );
            }
        }
        let verdicts = self.detector.batch_check(paths, &known).await;
        Ok(change::resolve_batch(verdicts))
    }
}
