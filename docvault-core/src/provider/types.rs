//! Common types for embedding providers.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when requesting an embedding.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Provider error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Provider trait for embedding backends.
///
/// Implementations map a text string to a fixed-length vector. Every text
/// embedded against the same store must come back with the same dimension;
/// mixing providers of different dimensions in one store is a configuration
/// error that surfaces loudly at scoring time.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
