//! Generation service access
//!
//! Two narrow capabilities are consumed by the pipeline: plain text completion
//! and image-conditioned completion. Both are served by the same model family,
//! so one [`LlmClient`] implements both traits.

pub mod client;

use async_trait::async_trait;

pub use client::LlmClient;
use crate::errors::Result;
use crate::models::RoomImage;

/// Sampling parameters for a single completion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 2000,
            temperature: 0.7,
        }
    }
}

/// Text-only completion
#[async_trait]
pub trait TextGeneration: Send + Sync {
    async fn complete(&self, prompt: &str, max_tokens: usize, temperature: f32) -> Result<String>;
}

/// Completion conditioned on an optional image
#[async_trait]
pub trait VisionGeneration: Send + Sync {
    async fn complete_with_image(&self, message: &str, image: Option<&RoomImage>) -> Result<String>;
}
