use thiserror::Error;

use crate::models::PipelineStage;

#[derive(Error, Debug)]
pub enum ShopAssistError {
    /// Vision or text generation service failed or timed out
    #[error("Upstream inference error during {stage}: {message}")]
    UpstreamInference {
        stage: PipelineStage,
        message: String,
    },

    /// Vector store unreachable or returned malformed data
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// A required configuration value is missing or invalid
    #[error("Startup configuration error: {0}")]
    StartupConfiguration(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request cancelled before {stage}")]
    Cancelled { stage: PipelineStage },

    /// The single externally visible failure of a pipeline run
    #[error("Recommendation failed during {stage}: {message}")]
    Pipeline {
        stage: PipelineStage,
        message: String,
    },

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ShopAssistError {
    /// Stage the error is attributed to, if any
    #[must_use]
    pub const fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::UpstreamInference { stage, .. }
            | Self::Cancelled { stage }
            | Self::Pipeline { stage, .. } => Some(*stage),
            Self::Retrieval(_) | Self::EmbeddingError(_) | Self::Database(_) => {
                Some(PipelineStage::Retrieving)
            }
            _ => None,
        }
    }

    pub(crate) fn upstream(stage: PipelineStage, message: impl Into<String>) -> Self {
        Self::UpstreamInference {
            stage,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ShopAssistError>;
