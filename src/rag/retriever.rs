//! Retrieval stage: composite similarity search over the catalog

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::catalog::CatalogStore;
use crate::errors::Result;
use crate::errors::ShopAssistError;
use crate::models::CatalogDocument;
use crate::models::StyleDescription;
use crate::rag::prompts::build_retrieval_query;

/// Retriever for catalog items matching both the request and the room style
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn CatalogStore>,
    top_k: usize,
    timeout: Duration,
}

impl Retriever {
    /// Create a new retriever with a fixed result cap
    pub fn new(store: Arc<dyn CatalogStore>, top_k: usize, timeout: Duration) -> Self {
        Self {
            store,
            top_k,
            timeout,
        }
    }

    /// Run one similarity query. Documents keep the store's order.
    ///
    /// An empty result is returned as an empty vector.
    pub async fn retrieve(
        &self,
        user_text: &str,
        description: &StyleDescription,
    ) -> Result<Vec<CatalogDocument>> {
        let query = build_retrieval_query(user_text, description);
        debug!("Vector search query: {}", query);

        let search = self.store.similarity_search(&query, self.top_k);
        let mut docs = match tokio::time::timeout(self.timeout, search).await {
            Ok(Ok(docs)) => docs,
            Ok(Err(ShopAssistError::Retrieval(msg))) => return Err(ShopAssistError::Retrieval(msg)),
            Ok(Err(e)) => return Err(ShopAssistError::Retrieval(e.to_string())),
            Err(_) => {
                return Err(ShopAssistError::Retrieval(format!(
                    "vector search timed out after {:?}",
                    self.timeout
                )))
            }
        };

        docs.truncate(self.top_k);
        debug!("Retrieved documents: {}", docs.len());
        Ok(docs)
    }
}
