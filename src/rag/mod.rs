//! Recommendation pipeline for the Online Boutique assistant
//!
//! A request flows through four stages:
//! - Room style description from the uploaded image
//! - Catalog retrieval with a composite request + style query
//! - Recommendation generation over the retrieved candidates
//! - Extraction of the recommended product ids
//!
//! # Examples
//!
//! ```rust,no_run
//! use shopassist::config::AppConfig;
//! use shopassist::models::RecommendationRequest;
//! use shopassist::rag::PipelineContext;
//! use shopassist::rag::RecommendationPipeline;
//! use shopassist::secrets::EnvSecretStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let context = PipelineContext::from_config(&config, &EnvSecretStore::new(None)).await?;
//!     let pipeline = RecommendationPipeline::new(context);
//!
//!     let request = RecommendationRequest::new("I want to add a rug", None)?;
//!     let result = pipeline.recommend(&request).await?;
//!     println!("{}", result.display_text);
//!     println!("Products: {:?}", result.product_ids);
//!
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod formatter;
pub mod generator;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
pub mod vision;

pub use context::ContextAssembler;
pub use formatter::ResponseFormatter;
pub use generator::Generator;
pub use pipeline::PipelineContext;
pub use pipeline::PipelineOutcome;
pub use pipeline::PipelineRun;
pub use pipeline::PipelineSettings;
pub use pipeline::PipelineState;
pub use pipeline::RecommendationPipeline;
pub use pipeline::StageFailure;
pub use retriever::Retriever;
pub use vision::VisionStage;
