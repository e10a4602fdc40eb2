//! API request and response types

use serde::Deserialize;
use serde::Serialize;

use crate::models::RecommendationResult;

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Chat request from the storefront
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Percent-encoded shopper message
    pub message: String,
    /// URL, data URL, or bare base64 image
    #[serde(default)]
    pub image: Option<String>,
}

/// Chat reply: the raw generated text
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
}

/// Structured recommendation
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub narrative: String,
    pub product_ids: Vec<String>,
    /// Narrative without the trailing id list
    pub content: String,
}

impl From<RecommendationResult> for RecommendResponse {
    fn from(result: RecommendationResult) -> Self {
        Self {
            narrative: result.narrative,
            product_ids: result.product_ids,
            content: result.display_text,
        }
    }
}
