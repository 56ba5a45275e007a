use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the document vector store.
///
/// This covers chunking behavior, the storage backend, and search defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Storage backend; the YAML shape is `storage: { mode: ..., path: ... }`.
    #[serde(default)]
    pub storage: StorageMode,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Configuration for splitting documents into chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window size in bytes (snapped to character boundaries).
    pub chunk_size: usize,
    /// Bytes shared between consecutive windows so phrases spanning a
    /// boundary stay retrievable from at least one chunk.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 50,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StorageMode {
    /// Volatile in-process storage, mostly useful for tests and previews.
    Memory,
    /// Embedded SQLite file, reindex decisions made from stored chunk rows.
    Embedded { path: String },
    /// Embedded SQLite file plus a per-file state table for cheap
    /// change detection (mtime/size short-circuit, batch checks).
    Incremental { path: String },
}

impl Default for StorageMode {
    fn default() -> Self {
        Self::Incremental {
            path: "./data/docvault.db".to_string(),
        }
    }
}

fn default_top_k() -> usize {
    5
}

/// Defaults applied to searches that don't specify their own limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of results returned from a similarity search.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Inclusive lower bound on cosine similarity; results below it are dropped.
    #[serde(default)]
    pub min_similarity: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_similarity: 0.0,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            storage: StorageMode::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
