//! HTTP client for a Claude-style messages endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::GenerationParams;
use super::TextGeneration;
use super::VisionGeneration;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::errors::ShopAssistError;
use crate::models::RoomImage;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Client for the text and vision generation service
#[derive(Clone)]
pub struct LlmClient {
    endpoint: String,
    api_key: Option<String>,
    text_model: String,
    vision_model: String,
    vision_params: GenerationParams,
    client: Client,
}

impl LlmClient {
    /// Create a client from configuration
    ///
    /// # Errors
    /// - HTTP client build errors
    pub fn new(config: &AppConfig) -> Result<Self> {
        let timeout = config.vision_timeout().max(config.generation_timeout());
        let client = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ShopAssistError::HttpError(e.to_string()))?;

        Ok(Self {
            endpoint: config.llm.llm_endpoint.trim_end_matches('/').to_string(),
            api_key: config.llm.llm_key.clone(),
            text_model: config.llm.text_model.clone(),
            vision_model: config.llm.vision_model.clone(),
            vision_params: GenerationParams {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            },
            client,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(key.trim())
                    .map_err(|_| ShopAssistError::StartupConfiguration("invalid LLM API key".into()))?,
            );
        }
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, body: &MessagesRequest<'_>) -> Result<String> {
        let url = format!("{}/messages", self.endpoint);
        debug!("Calling messages API: {} (model {})", url, body.model);

        let response = self
            .client
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| ShopAssistError::HttpError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ShopAssistError::LlmError(format!(
                "messages API error ({status}): {error_text}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ShopAssistError::LlmError(format!("Failed to parse response: {e}")))?;

        extract_text(parsed)
    }
}

#[async_trait]
impl TextGeneration for LlmClient {
    async fn complete(&self, prompt: &str, max_tokens: usize, temperature: f32) -> Result<String> {
        let body = MessagesRequest {
            model: &self.text_model,
            max_tokens,
            temperature,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock::Text { text: prompt }],
            }],
        };
        self.send(&body).await
    }
}

#[async_trait]
impl VisionGeneration for LlmClient {
    async fn complete_with_image(&self, message: &str, image: Option<&RoomImage>) -> Result<String> {
        let body = MessagesRequest {
            model: &self.vision_model,
            max_tokens: self.vision_params.max_tokens,
            temperature: self.vision_params.temperature,
            messages: vec![Message {
                role: "user",
                content: vision_content(message, image),
            }],
        };
        self.send(&body).await
    }
}

/// Image block first, then the instruction
fn vision_content<'a>(message: &'a str, image: Option<&'a RoomImage>) -> Vec<ContentBlock<'a>> {
    let mut content = Vec::with_capacity(2);
    match image {
        Some(inline @ RoomImage::Inline { media_type, .. }) => content.push(ContentBlock::Image {
            source: ImageSource::Base64 {
                media_type,
                data: inline.base64_data().unwrap_or_default(),
            },
        }),
        Some(RoomImage::Url(url)) => content.push(ContentBlock::Image {
            source: ImageSource::Url { url },
        }),
        None => {}
    }
    content.push(ContentBlock::Text { text: message });
    content
}

fn extract_text(response: MessagesResponse) -> Result<String> {
    let text = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ResponseBlock::Text { text } => Some(text),
            ResponseBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if text.trim().is_empty() {
        return Err(ShopAssistError::LlmError(
            "response missing text content".to_string(),
        ));
    }
    Ok(text)
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Text { text: &'a str },
    Image { source: ImageSource<'a> },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ImageSource<'a> {
    Base64 { media_type: &'a str, data: String },
    Url { url: &'a str },
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
