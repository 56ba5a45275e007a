//! Embedding generation for store operations.
//!
//! Thin wrapper shared by every store variant; all chunk and query
//! embeddings flow through here so provider failures convert uniformly.

use crate::provider::{EmbeddingProvider, ProviderError};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The provider failed or is unavailable.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The provider returned a zero-length vector.
    #[error("Provider returned an empty embedding")]
    EmptyEmbedding,
}

pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Generates embeddings via the configured provider.
#[derive(Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
}

impl Embedder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { provider }
    }

    /// Embed one text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embedding = self.provider.embed(text).await?;
        if embedding.is_empty() {
            return Err(EmbedderError::EmptyEmbedding);
        }
        Ok(embedding)
    }

    /// Embed a batch of texts sequentially.
    ///
    /// Any failure aborts the batch so the caller never persists a
    /// partially embedded document.
    pub async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}
