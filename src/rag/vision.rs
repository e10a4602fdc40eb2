//! Room style description from an optional image

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::Result;
use crate::errors::ShopAssistError;
use crate::llm::VisionGeneration;
use crate::models::PipelineStage;
use crate::models::RoomImage;
use crate::models::StyleDescription;
use crate::rag::prompts::VISION_INSTRUCTION;

/// First pipeline stage: describe the interior style of the room
#[derive(Clone)]
pub struct VisionStage {
    model: Arc<dyn VisionGeneration>,
    timeout: Duration,
}

impl VisionStage {
    pub fn new(model: Arc<dyn VisionGeneration>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Describe the room. Without an image the fixed instruction is sent alone.
    pub async fn describe(&self, image: Option<&RoomImage>) -> Result<StyleDescription> {
        match image {
            Some(image) => debug!("Describing room from image {}", image.digest()),
            None => debug!("No image supplied, requesting a generic style description"),
        }

        let call = self.model.complete_with_image(VISION_INSTRUCTION, image);
        let text = match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(ShopAssistError::upstream(PipelineStage::Describing, e.to_string())),
            Err(_) => {
                return Err(ShopAssistError::upstream(
                    PipelineStage::Describing,
                    format!("vision call timed out after {:?}", self.timeout),
                ))
            }
        };

        Ok(StyleDescription::new(text))
    }
}
