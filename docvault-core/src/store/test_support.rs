//! Shared helpers for store tests.

use crate::provider::{EmbeddingProvider, ProviderError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

const DIMENSION: usize = 32;

/// Deterministic embedding provider for tests.
///
/// Each word contributes to the dimension picked by its first byte, so
/// texts sharing words score high cosine similarity and disjoint texts
/// score zero. Successful calls are counted, and the provider can be
/// switched into a failing mode to exercise degraded paths.
pub(crate) struct MockProvider {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockProvider {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        })
    }

    /// Number of successful embedding calls served so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for MockProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ProviderError::Api("mock provider offline".to_string()));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut embedding = vec![0.0f32; DIMENSION];
        let words = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        for word in words {
            let first = word.as_bytes()[0] as usize;
            embedding[first % DIMENSION] += 1.0;
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn related_texts_share_dimensions() {
        let provider = MockProvider::shared();
        let hello = provider.embed("hello world").await.unwrap();
        let query = provider.embed("hello").await.unwrap();
        let goodbye = provider.embed("goodbye world").await.unwrap();

        let dot =
            |a: &[f32], b: &[f32]| a.iter().zip(b).map(|(x, y)| x * y).sum::<f32>();
        assert!(dot(&query, &hello) > dot(&query, &goodbye));
        assert_eq!(provider.calls(), 3);
    }
}
