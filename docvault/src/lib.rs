//! docvault - Embedded document vector store
//!
//! This is the convenience wrapper crate that re-exports the docvault
//! engine for easy usage.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! docvault = "0.1"
//! ```
//!
//! Bring your own [`EmbeddingProvider`](docvault_core::EmbeddingProvider),
//! pick a storage mode in the config, and go:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use docvault::prelude::*;
//! # async fn example(provider: Arc<dyn EmbeddingProvider>) {
//! let config = Config::default();
//! let store = create_vector_store(&config, provider).unwrap();
//!
//! store
//!     .index_document("manual.txt", "how to configure the widget", None)
//!     .await
//!     .unwrap();
//!
//! let results = store.search(&RagQuery::new("widget setup")).await.unwrap();
//! # }
//! ```

// Re-export core
pub use docvault_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use docvault_core::{
        create_vector_store, Config, DocumentChunk, EmbeddingProvider, RagQuery, SearchResult,
        StorageMode, StoreError, VectorStore,
    };
}
