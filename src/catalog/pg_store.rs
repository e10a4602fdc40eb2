//! Postgres + pgvector catalog client
//!
//! Reads the LangChain-style layout used to load the catalog: a
//! `langchain_pg_collection` table naming collections and a
//! `langchain_pg_embedding` table holding one row per product document.

use std::time::Duration;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use sqlx::Row;
use tracing::debug;
use tracing::info;
use url::Url;

use super::CatalogStore;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingClient;
use crate::errors::Result;
use crate::errors::ShopAssistError;
use crate::models::CatalogDocument;
use crate::secrets::DbCredentials;

/// Catalog backed by a pgvector collection
pub struct PgVectorCatalog {
    pool: PgPool,
    collection: String,
    embedder: EmbeddingClient,
}

impl PgVectorCatalog {
    /// Create from an existing pool
    pub fn new(pool: PgPool, collection: impl Into<String>, embedder: EmbeddingClient) -> Self {
        Self {
            pool,
            collection: collection.into(),
            embedder,
        }
    }

    /// Connect using validated configuration and resolved credentials
    ///
    /// # Errors
    /// - Invalid host/port/name combinations
    /// - Database connection errors
    pub async fn connect(
        config: &AppConfig,
        credentials: &DbCredentials,
        embedder: EmbeddingClient,
    ) -> Result<Self> {
        let url = connection_url(config, credentials)?;
        info!(
            "Connecting to catalog database {}:{}/{}",
            config.database_host(),
            config.database.port,
            config.database_name()
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
            .connect(url.as_str())
            .await
            .map_err(|e| ShopAssistError::Retrieval(format!("cannot connect to catalog: {e}")))?;

        Ok(Self::new(pool, config.collection_name(), embedder))
    }

    /// Name of the collection queried
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl CatalogStore for PgVectorCatalog {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<CatalogDocument>> {
        let embedding = self
            .embedder
            .generate(query)
            .await
            .map_err(|e| ShopAssistError::Retrieval(format!("query embedding failed: {e}")))?;

        debug!(
            "Similarity search in collection {} (k = {})",
            self.collection, k
        );

        let rows = sqlx::query(
            r#"
            SELECT
                e.id::text AS id,
                e.document,
                e.cmetadata,
                e.embedding <=> $1 AS distance
            FROM langchain_pg_embedding e
            JOIN langchain_pg_collection c ON e.collection_id = c.uuid
            WHERE c.name = $2
            ORDER BY e.embedding <=> $1
            LIMIT $3
            "#,
        )
        .bind(Vector::from(embedding))
        .bind(&self.collection)
        .bind(k as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShopAssistError::Retrieval(format!("similarity query failed: {e}")))?;

        rows.iter()
            .map(|row| {
                let id: Option<String> = row.try_get("id").map_err(malformed)?;
                let document: Option<String> = row.try_get("document").map_err(malformed)?;
                let metadata: Option<serde_json::Value> =
                    row.try_get("cmetadata").map_err(malformed)?;
                let distance: Option<f64> = row.try_get("distance").map_err(malformed)?;
                document_from_row(id, document, metadata, distance)
            })
            .collect()
    }
}

fn malformed(e: sqlx::Error) -> ShopAssistError {
    ShopAssistError::Retrieval(format!("malformed catalog row: {e}"))
}

/// Build the database URL, percent-encoding credentials
pub(crate) fn connection_url(config: &AppConfig, credentials: &DbCredentials) -> Result<Url> {
    let mut url = Url::parse(&format!(
        "postgres://{}:{}/{}",
        config.database_host(),
        config.database.port,
        config.database_name()
    ))
    .map_err(|e| ShopAssistError::StartupConfiguration(format!("invalid database address: {e}")))?;

    url.set_username(&credentials.username)
        .and_then(|()| url.set_password(Some(credentials.password())))
        .map_err(|()| {
            ShopAssistError::StartupConfiguration("cannot embed database credentials".to_string())
        })?;

    Ok(url)
}

/// Adapt one catalog row to a `CatalogDocument`.
///
/// The product id is taken from the `id` metadata key when the loader stored one,
/// otherwise from the row id.
pub(crate) fn document_from_row(
    row_id: Option<String>,
    document: Option<String>,
    metadata: Option<serde_json::Value>,
    distance: Option<f64>,
) -> Result<CatalogDocument> {
    let content = document
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ShopAssistError::Retrieval("catalog row has no document".to_string()))?;

    let metadata = metadata.unwrap_or(serde_json::Value::Null);
    let id = metadata
        .get("id")
        .and_then(|v| match v {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .or(row_id)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ShopAssistError::Retrieval("catalog row has no id".to_string()))?;

    Ok(CatalogDocument {
        id,
        content,
        score: distance.map(|d| (1.0 - d) as f32),
        metadata,
    })
}
