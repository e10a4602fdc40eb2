//! Query embedding for catalog similarity search
//!
//! The catalog collection is embedded out-of-band; this module only embeds the
//! composite retrieval query with the same model, using one of:
//! - OpenAI-compatible `/embeddings` endpoints
//! - Ollama (local models)

pub mod client;

pub use client::EmbeddingClient;
pub use client::EmbeddingProvider;

use crate::errors::Result;
use crate::errors::ShopAssistError;

/// Longest query text sent to the embedding endpoint
pub const MAX_EMBEDDING_CHARS: usize = 4000;

/// Configuration for query embedding
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl EmbeddingConfig {
    pub fn from_app_config(config: &crate::config::AppConfig) -> Result<Self> {
        let provider = match config.embeddings.provider.to_ascii_lowercase().as_str() {
            "openai" => EmbeddingProvider::OpenAI,
            "ollama" => EmbeddingProvider::Ollama,
            other => {
                return Err(ShopAssistError::StartupConfiguration(format!(
                    "unknown embedding provider '{other}'"
                )))
            }
        };

        if provider == EmbeddingProvider::OpenAI && config.embeddings.api_key.is_none() {
            return Err(ShopAssistError::StartupConfiguration(
                "OpenAI embeddings require embeddings.api_key".to_string(),
            ));
        }

        Ok(Self {
            provider,
            model: config.embeddings.model.clone(),
            dimension: config.embeddings.dimension,
            endpoint: config.embeddings.endpoint.trim_end_matches('/').to_string(),
            api_key: config.embeddings.api_key.clone(),
        })
    }
}

/// Normalize whitespace and control characters before embedding
pub fn preprocess_text_for_embedding(text: &str) -> Result<String> {
    let normalized = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    if normalized.is_empty() {
        return Err(ShopAssistError::EmbeddingError(
            "Text contains only whitespace after preprocessing".to_string(),
        ));
    }

    if normalized.chars().count() > MAX_EMBEDDING_CHARS {
        return Ok(normalized.chars().take(MAX_EMBEDDING_CHARS).collect());
    }

    Ok(normalized)
}
