//! Recommendation generation stage

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::errors::Result;
use crate::errors::ShopAssistError;
use crate::llm::GenerationParams;
use crate::llm::TextGeneration;
use crate::models::CatalogDocument;
use crate::models::GenerationPrompt;
use crate::models::PipelineStage;
use crate::models::StyleDescription;
use crate::rag::prompts::build_design_prompt;
use crate::rag::ContextAssembler;

/// Augmented generation over the retrieved candidates
#[derive(Clone)]
pub struct Generator {
    model: Arc<dyn TextGeneration>,
    context_assembler: ContextAssembler,
    params: GenerationParams,
    timeout: Duration,
}

impl Generator {
    pub fn new(
        model: Arc<dyn TextGeneration>,
        context_assembler: ContextAssembler,
        params: GenerationParams,
        timeout: Duration,
    ) -> Self {
        Self {
            model,
            context_assembler,
            params,
            timeout,
        }
    }

    /// Assemble the design prompt for a request
    pub fn build_prompt(
        &self,
        user_text: &str,
        description: &StyleDescription,
        docs: &[CatalogDocument],
    ) -> GenerationPrompt {
        let (candidates, offered) = self.context_assembler.assemble_with_ids(docs);
        debug!("Candidates offered to the model: {:?}", offered);
        build_design_prompt(description, &candidates, user_text)
    }

    /// Generate the raw recommendation text with a single model call
    pub async fn generate(
        &self,
        user_text: &str,
        description: &StyleDescription,
        docs: &[CatalogDocument],
    ) -> Result<String> {
        let prompt = self.build_prompt(user_text, description, docs);
        debug!("Final design prompt: {}", prompt.text);

        let call = self
            .model
            .complete(&prompt.text, self.params.max_tokens, self.params.temperature);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ShopAssistError::upstream(PipelineStage::Generating, e.to_string())),
            Err(_) => Err(ShopAssistError::upstream(
                PipelineStage::Generating,
                format!("generation call timed out after {:?}", self.timeout),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::rag::context::NO_CANDIDATES_MARKER;
    use crate::rag::prompts::OUTPUT_FORMAT_INSTRUCTION;

    struct EchoModel;

    #[async_trait]
    impl TextGeneration for EchoModel {
        async fn complete(&self, prompt: &str, _max_tokens: usize, _temperature: f32) -> Result<String> {
            Ok(prompt.to_string())
        }
    }

    struct SlowModel;

    #[async_trait]
    impl TextGeneration for SlowModel {
        async fn complete(&self, _prompt: &str, _max_tokens: usize, _temperature: f32) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    fn generator(model: Arc<dyn TextGeneration>, timeout: Duration) -> Generator {
        Generator::new(
            model,
            ContextAssembler::default(),
            GenerationParams::default(),
            timeout,
        )
    }

    #[test]
    fn test_prompt_for_empty_docs_has_marker() {
        let generator = generator(Arc::new(EchoModel), Duration::from_secs(1));
        let prompt = generator.build_prompt("add a rug", &StyleDescription::new("boho"), &[]);
        assert!(prompt.text.contains(NO_CANDIDATES_MARKER));
        assert!(prompt.text.contains(OUTPUT_FORMAT_INSTRUCTION));
    }

    #[test]
    fn test_prompt_lists_candidates() {
        let generator = generator(Arc::new(EchoModel), Duration::from_secs(1));
        let docs = vec![CatalogDocument::new("RUG1", "id: RUG1, Wool Rug")];
        let prompt = generator.build_prompt("add a rug", &StyleDescription::new("boho"), &docs);
        assert!(prompt.text.contains("id: RUG1, Wool Rug"));
        assert!(!prompt.text.contains(NO_CANDIDATES_MARKER));
    }

    #[tokio::test]
    async fn test_generate_returns_raw_text() {
        let generator = generator(Arc::new(EchoModel), Duration::from_secs(1));
        let text = generator
            .generate("add a rug", &StyleDescription::new("boho"), &[])
            .await
            .unwrap();
        assert!(text.contains("add a rug"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_timeout_is_upstream_error() {
        let generator = generator(Arc::new(SlowModel), Duration::from_millis(100));
        let err = generator
            .generate("add a rug", &StyleDescription::new("boho"), &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShopAssistError::UpstreamInference {
                stage: PipelineStage::Generating,
                ..
            }
        ));
    }
}
