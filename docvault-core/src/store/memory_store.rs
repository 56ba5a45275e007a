//! Volatile in-process store variant.

use super::change::{self, content_hash, ChangeDetector, FsChangeDetector};
use super::chunker::chunk_text;
use super::embedder::Embedder;
use super::similarity;
use super::types::{assemble_chunks, DocumentChunk, FileMetadata, RagQuery, SearchResult};
use super::vector_store::VectorStore;
use super::Result;
use crate::config::Config;
use crate::provider::EmbeddingProvider;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// In-memory vector store.
///
/// Same contract as the persistent variants, nothing survives the process.
/// Change detection still applies: reindexing identical content makes no
/// embedding calls.
pub struct MemoryStore {
    chunks: RwLock<Vec<DocumentChunk>>,
    embedder: Embedder,
    chunk_size: usize,
    chunk_overlap: usize,
    detector: FsChangeDetector,
}

impl MemoryStore {
    pub fn new(config: &Config, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
            embedder: Embedder::new(provider),
            chunk_size: config.chunking.chunk_size,
            chunk_overlap: config.chunking.chunk_overlap,
            detector: FsChangeDetector,
        }
    }

    async fn stored_hash(&self, source_file: &str) -> Option<String> {
        self.chunks
            .read()
            .await
            .iter()
            .find(|c| c.source_file == source_file)
            .map(|c| c.file_hash.clone())
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
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
        if self.stored_hash(source_file).await.as_deref() == Some(hash.as_str()) {
            debug!("{source_file} unchanged, skipping reindex");
            return Ok(());
        }

        let pieces = chunk_text(content, self.chunk_size, self.chunk_overlap);
        if pieces.is_empty() {
            return Ok(());
        }

        let embeddings = self.embedder.embed_many(&pieces).await?;
        let rows = assemble_chunks(source_file, pieces, embeddings, metadata, &hash);

        let mut chunks = self.chunks.write().await;
        chunks.retain(|c| c.source_file != source_file);
        chunks.extend(rows);
        Ok(())
    }

    async fn search(&self, query: &RagQuery) -> Result<Vec<SearchResult>> {
        let query_embedding = match self.embedder.embed(&query.query).await {
            Ok(embedding) => embedding,
            Err(error) => {
                tracing::warn!("Query embedding failed, returning no results: {error}");
                return Ok(Vec::new());
            }
        };

        let candidates: Vec<DocumentChunk> = self
            .chunks
            .read()
            .await
            .iter()
            .filter(|c| {
                query.file_filters.is_empty()
                    || query
                        .file_filters
                        .iter()
                        .any(|f| c.source_file.contains(f.as_str()))
            })
            .cloned()
            .collect();

        similarity::rank(
            &query_embedding,
            candidates,
            query.min_similarity,
            query.top_k,
        )
    }

    async fn chunk_count(&self) -> usize {
        self.chunks.read().await.len()
    }

    async fn indexed_files(&self) -> Vec<String> {
        let chunks = self.chunks.read().await;
        let mut files: Vec<String> = chunks.iter().map(|c| c.source_file.clone()).collect();
        files.sort();
        files.dedup();
        files
    }

    async fn remove_document(&self, source_file: &str) -> Result<()> {
        self.chunks
            .write()
            .await
            .retain(|c| c.source_file != source_file);
        Ok(())
    }

    async fn clear_index(&self) -> Result<()> {
        self.chunks.write().await.clear();
        Ok(())
    }

    async fn batch_check_files_for_changes(
        &self,
        paths: &[String],
    ) -> Result<HashMap<String, bool>> {
        let mut known = HashMap::new();
        for path in paths {
            if let Some(hash) = self.stored_hash(path).await {
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
