//! One-shot recommendation handler

use std::path::Path;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::output::*;
use crate::models::RecommendationRequest;
use crate::models::RoomImage;
use crate::rag::PipelineContext;
use crate::rag::RecommendationPipeline;
use crate::secrets::SecretStore;
use crate::AppConfig;
use crate::Result;

pub async fn handle_ask_command(
    config: &AppConfig,
    secrets: &dyn SecretStore,
    message: String,
    image: Option<&Path>,
    trace: bool,
) -> Result<()> {
    let image = match image {
        Some(path) => {
            let bytes = tokio::fs::read(path).await?;
            info!("Loaded room image {} ({} bytes)", path.display(), bytes.len());
            Some(RoomImage::from_bytes(bytes))
        }
        None => None,
    };
    let request = RecommendationRequest::new(message, image)?;

    print_info("Connecting to catalog and generation services...");
    let context = PipelineContext::from_config(config, secrets).await?;
    let pipeline = RecommendationPipeline::new(context);

    let outcome = pipeline.run(&request, &CancellationToken::new()).await;
    if trace {
        print_run_trace(&outcome.run);
        println!();
    }

    let result = outcome.result?;
    print_recommendation(&result);
    print_success("Done");
    Ok(())
}
