//! Data types flowing through the recommendation pipeline

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

use crate::errors::Result;
use crate::errors::ShopAssistError;

/// Maximum number of product identifiers returned with a recommendation
pub const MAX_PRODUCT_IDS: usize = 3;

/// Pipeline stage that can fail, used to attribute errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Describing,
    Retrieving,
    Generating,
    Formatting,
}

impl PipelineStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Describing => "describing",
            Self::Retrieving => "retrieving",
            Self::Generating => "generating",
            Self::Formatting => "formatting",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Room image attached to a request
#[derive(Clone, PartialEq, Eq)]
pub enum RoomImage {
    /// Raw image bytes with their media type
    Inline { media_type: String, data: Vec<u8> },
    /// Remote image the generation service fetches itself
    Url(String),
}

impl RoomImage {
    /// Parse an inbound image reference.
    ///
    /// Accepts `http(s)://` URLs, `data:<media>;base64,<payload>` URLs, and bare base64.
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(ShopAssistError::InvalidRequest(
                "image reference is empty".to_string(),
            ));
        }

        if reference.starts_with("http://") || reference.starts_with("https://") {
            return Ok(Self::Url(reference.to_string()));
        }

        if let Some(rest) = reference.strip_prefix("data:") {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                ShopAssistError::InvalidRequest("malformed data URL".to_string())
            })?;
            let media_type = header
                .strip_suffix(";base64")
                .ok_or_else(|| {
                    ShopAssistError::InvalidRequest("data URL is not base64 encoded".to_string())
                })?
                .to_string();
            let data = decode_base64(payload)?;
            return Ok(Self::Inline { media_type, data });
        }

        let data = decode_base64(reference)?;
        Ok(Self::from_bytes(data))
    }

    /// Wrap raw bytes, sniffing the media type from the magic number
    #[must_use]
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let media_type = sniff_media_type(&data).to_string();
        Self::Inline { media_type, data }
    }

    /// Short content digest, safe to log
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        match self {
            Self::Inline { data, .. } => hasher.update(data),
            Self::Url(url) => hasher.update(url.as_bytes()),
        }
        let hash = hex::encode(hasher.finalize());
        hash[..12].to_string()
    }

    /// Base64 payload for inline images
    #[must_use]
    pub fn base64_data(&self) -> Option<String> {
        match self {
            Self::Inline { data, .. } => Some(BASE64.encode(data)),
            Self::Url(_) => None,
        }
    }
}

impl fmt::Debug for RoomImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline { media_type, data } => f
                .debug_struct("Inline")
                .field("media_type", media_type)
                .field("bytes", &data.len())
                .field("digest", &self.digest())
                .finish(),
            Self::Url(url) => f.debug_tuple("Url").field(url).finish(),
        }
    }
}

fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    BASE64
        .decode(compact)
        .map_err(|e| ShopAssistError::InvalidRequest(format!("image is not valid base64: {e}")))
}

fn sniff_media_type(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/jpeg",
    }
}

/// One incoming recommendation call
#[derive(Debug, Clone)]
pub struct RecommendationRequest {
    user_text: String,
    image: Option<RoomImage>,
}

impl RecommendationRequest {
    /// Build a request, rejecting an empty message
    pub fn new(user_text: impl Into<String>, image: Option<RoomImage>) -> Result<Self> {
        let user_text = user_text.into();
        if user_text.trim().is_empty() {
            return Err(ShopAssistError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }
        Ok(Self { user_text, image })
    }

    /// Build a request from the wire form: percent-encoded message plus optional image reference
    pub fn from_wire(message: &str, image: Option<&str>) -> Result<Self> {
        let decoded = percent_decode_str(message).decode_utf8_lossy().into_owned();
        let image = match image {
            Some(reference) if !reference.trim().is_empty() => Some(RoomImage::parse(reference)?),
            _ => None,
        };
        Self::new(decoded, image)
    }

    #[must_use]
    pub fn user_text(&self) -> &str {
        &self.user_text
    }

    #[must_use]
    pub const fn image(&self) -> Option<&RoomImage> {
        self.image.as_ref()
    }
}

/// Free-text interior style description produced by the vision stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescription {
    pub text: String,
}

impl StyleDescription {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Read-only copy of a catalog hit returned by the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub id: String,
    pub content: String,
    /// Similarity score reported by the store, higher is closer
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl CatalogDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            score: None,
            metadata: serde_json::Value::Null,
        }
    }
}

/// Prompt sent to the text generation service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationPrompt {
    pub text: String,
}

/// Terminal artifact of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Unmodified model output, identifier markup included
    pub narrative: String,
    /// Up to three product ids in descending relevance
    pub product_ids: Vec<String>,
    /// Narrative with the trailing identifier list stripped, for display
    pub display_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_rejects_blank_message() {
        let err = RecommendationRequest::new("   ", None).unwrap_err();
        assert!(matches!(err, ShopAssistError::InvalidRequest(_)));
    }

    #[test]
    fn test_from_wire_unquotes_message() {
        let request = RecommendationRequest::from_wire("add%20a%20rug", None).unwrap();
        assert_eq!(request.user_text(), "add a rug");
        assert!(request.image().is_none());
    }

    #[test]
    fn test_from_wire_ignores_empty_image() {
        let request = RecommendationRequest::from_wire("lamp", Some("")).unwrap();
        assert!(request.image().is_none());
    }

    #[test]
    fn test_parse_http_image() {
        let image = RoomImage::parse("https://example.com/room.jpg").unwrap();
        assert_eq!(image, RoomImage::Url("https://example.com/room.jpg".to_string()));
        assert!(image.base64_data().is_none());
    }

    #[test]
    fn test_parse_data_url() {
        let payload = BASE64.encode([0x89, b'P', b'N', b'G', 1, 2, 3]);
        let image = RoomImage::parse(&format!("data:image/png;base64,{payload}")).unwrap();
        match image {
            RoomImage::Inline { media_type, data } => {
                assert_eq!(media_type, "image/png");
                assert_eq!(data.len(), 7);
            }
            RoomImage::Url(_) => panic!("expected inline image"),
        }
    }

    #[test]
    fn test_parse_bare_base64_sniffs_type() {
        let payload = BASE64.encode([0xFF, 0xD8, 0xFF, 0xE0, 0, 0]);
        let image = RoomImage::parse(&payload).unwrap();
        assert!(matches!(image, RoomImage::Inline { ref media_type, .. } if media_type == "image/jpeg"));
    }

    #[test]
    fn test_parse_invalid_base64() {
        let err = RoomImage::parse("not base64 !!").unwrap_err();
        assert!(matches!(err, ShopAssistError::InvalidRequest(_)));
    }

    #[test]
    fn test_digest_is_stable_and_short() {
        let image = RoomImage::from_bytes(vec![1, 2, 3]);
        assert_eq!(image.digest(), image.digest());
        assert_eq!(image.digest().len(), 12);
        assert!(!format!("{image:?}").contains("[1, 2, 3]"));
    }
}
