//! Catalog vector store access
//!
//! The pipeline only reads from the catalog: one similarity query per request
//! against a single pre-populated collection.

pub mod pg_store;

use async_trait::async_trait;

pub use pg_store::PgVectorCatalog;
use crate::errors::Result;
use crate::models::CatalogDocument;

/// Similarity search over the embedded product catalog
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Return up to `k` documents ordered from most to least similar.
    ///
    /// An empty vector means nothing relevant was found and is not an error.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<CatalogDocument>>;
}
