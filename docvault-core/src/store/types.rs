use crate::config::SearchConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// A unit of retrievable text stored in the vector store.
///
/// Chunks are created only by indexing a document. All chunks of one file
/// share the same `file_hash`, and their `chunk_index` values are
/// consecutive starting at zero; reindexing a file replaces its whole chunk
/// set atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Identifier of the originating document (path or URI).
    pub source_file: String,
    /// Zero-based position of this chunk within its document.
    pub chunk_index: usize,
    /// The chunk's text slice.
    pub content: String,
    /// Fixed-length vector produced by the embedding provider for `content`.
    pub embedding: Vec<f32>,
    /// Open string-keyed bag of caller- and store-supplied values.
    pub metadata: HashMap<String, Value>,
    /// Hash of the whole source document at the time of indexing.
    pub file_hash: String,
    /// Timestamp of the write.
    pub indexed_at: DateTime<Utc>,
}

/// Per-file change-detection record kept by the incremental store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub file_path: String,
    /// Content hash recorded at index time.
    pub hash: String,
    /// File size in bytes (0 when the source is not a disk file).
    pub size: u64,
    /// Modification time in unix milliseconds, when the source is a
    /// readable disk file.
    pub last_modified: Option<i64>,
    /// When the file was last compared against its stored state.
    pub last_checked: DateTime<Utc>,
}

/// A similarity search request.
///
/// ```
/// use docvault_core::RagQuery;
///
/// let query = RagQuery::new("error handling")
///     .with_top_k(3)
///     .with_min_similarity(0.2)
///     .with_file_filters(vec!["docs/".to_string()]);
/// assert_eq!(query.top_k, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagQuery {
    /// The question or text to find relevant chunks for.
    pub query: String,
    /// Maximum number of results.
    pub top_k: usize,
    /// Inclusive lower bound on cosine similarity.
    pub min_similarity: f32,
    /// Substring filters on `source_file`; a chunk matches if its source
    /// contains *any* filter. Empty means no filtering.
    pub file_filters: Vec<String>,
}

impl RagQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: 5,
            min_similarity: 0.0,
            file_filters: Vec::new(),
        }
    }

    /// Build a query using the configured search defaults instead of the
    /// built-in ones.
    pub fn with_search_defaults(query: impl Into<String>, search: &SearchConfig) -> Self {
        Self {
            query: query.into(),
            top_k: search.top_k,
            min_similarity: search.min_similarity,
            file_filters: Vec::new(),
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_similarity(mut self, min_similarity: f32) -> Self {
        self.min_similarity = min_similarity;
        self
    }

    pub fn with_file_filters(mut self, file_filters: Vec<String>) -> Self {
        self.file_filters = file_filters;
        self
    }
}

/// A chunk paired with its similarity score for one query.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk: DocumentChunk,
    /// Cosine similarity against the query embedding, in `[-1.0, 1.0]`.
    pub similarity: f32,
}

/// Build the chunk rows for one (re)indexed document.
///
/// Caller metadata is merged first; the store-injected `file_name` and
/// `file_extension` keys win on collision. `pieces` and `embeddings` must be
/// the same length.
pub(crate) fn assemble_chunks(
    source_file: &str,
    pieces: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    metadata: Option<HashMap<String, Value>>,
    file_hash: &str,
) -> Vec<DocumentChunk> {
    debug_assert_eq!(pieces.len(), embeddings.len());

    let indexed_at = Utc::now();
    let mut base = metadata.unwrap_or_default();

    let path = Path::new(source_file);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        base.insert("file_name".to_string(), Value::String(name.to_string()));
    }
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        base.insert(
            "file_extension".to_string(),
            Value::String(ext.to_string()),
        );
    }

    pieces
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(chunk_index, (content, embedding))| DocumentChunk {
            source_file: source_file.to_string(),
            chunk_index,
            content,
            embedding,
            metadata: base.clone(),
            file_hash: file_hash.to_string(),
            indexed_at,
        })
        .collect()
}
