//! Complete recommendation pipeline: Describe -> Retrieve -> Generate -> Format

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use chrono::DateTime;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::info_span;
use tracing::Instrument;
use uuid::Uuid;

use crate::catalog::CatalogStore;
use crate::catalog::PgVectorCatalog;
use crate::config::AppConfig;
use crate::embeddings::EmbeddingClient;
use crate::embeddings::EmbeddingConfig;
use crate::errors::Result;
use crate::errors::ShopAssistError;
use crate::llm::GenerationParams;
use crate::llm::LlmClient;
use crate::llm::TextGeneration;
use crate::llm::VisionGeneration;
use crate::models::PipelineStage;
use crate::models::RecommendationRequest;
use crate::models::RecommendationResult;
use crate::rag::formatter::DEFAULT_TAIL_WINDOW;
use crate::rag::ContextAssembler;
use crate::rag::Generator;
use crate::rag::ResponseFormatter;
use crate::rag::Retriever;
use crate::rag::VisionStage;
use crate::secrets::SecretStore;

/// Lifecycle of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Received,
    Describing,
    Retrieving,
    Generating,
    Formatting,
    Completed,
    Failed,
}

impl From<PipelineStage> for PipelineState {
    fn from(stage: PipelineStage) -> Self {
        match stage {
            PipelineStage::Describing => Self::Describing,
            PipelineStage::Retrieving => Self::Retrieving,
            PipelineStage::Generating => Self::Generating,
            PipelineStage::Formatting => Self::Formatting,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Describing => "describing",
            Self::Retrieving => "retrieving",
            Self::Generating => "generating",
            Self::Formatting => "formatting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Stage and internal reason recorded when a run fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: PipelineStage,
    pub reason: String,
}

/// Diagnostic trace of a single run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub history: Vec<PipelineState>,
    pub failure: Option<StageFailure>,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            history: vec![PipelineState::Received],
            failure: None,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> PipelineState {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineState::Received)
    }

    /// Whether the run ever entered the given stage
    #[must_use]
    pub fn entered(&self, stage: PipelineStage) -> bool {
        self.history.contains(&PipelineState::from(stage))
    }

    fn advance(&mut self, state: PipelineState) {
        debug!("Pipeline {} -> {}", self.state(), state);
        self.history.push(state);
    }
}

/// Result of a run together with its trace
#[derive(Debug)]
pub struct PipelineOutcome {
    pub run: PipelineRun,
    pub result: Result<RecommendationResult>,
}

/// Tunables for a pipeline, resolved once from configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub top_k: usize,
    pub max_context_chars: usize,
    pub generation: GenerationParams,
    pub tail_window: usize,
    pub vision_timeout: Duration,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
}

impl PipelineSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_k: config.retrieval.top_k,
            max_context_chars: config.retrieval.max_context_chars,
            generation: GenerationParams {
                max_tokens: config.llm.max_tokens,
                temperature: config.llm.temperature,
            },
            tail_window: DEFAULT_TAIL_WINDOW,
            vision_timeout: config.vision_timeout(),
            retrieval_timeout: config.retrieval_timeout(),
            generation_timeout: config.generation_timeout(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Shared clients and settings, built once at startup
#[derive(Clone)]
pub struct PipelineContext {
    pub vision: Arc<dyn VisionGeneration>,
    pub text: Arc<dyn TextGeneration>,
    pub catalog: Arc<dyn CatalogStore>,
    pub settings: PipelineSettings,
}

impl PipelineContext {
    pub fn new(
        vision: Arc<dyn VisionGeneration>,
        text: Arc<dyn TextGeneration>,
        catalog: Arc<dyn CatalogStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            vision,
            text,
            catalog,
            settings,
        }
    }

    /// Build the production context: generation client, credentials, catalog pool
    ///
    /// # Errors
    /// - Missing required configuration values
    /// - Secret lookup failures
    /// - Catalog database connection errors
    pub async fn from_config(config: &AppConfig, secrets: &dyn SecretStore) -> Result<Self> {
        config.validate()?;

        let llm = Arc::new(LlmClient::new(config)?);
        let credentials = secrets.get_secret(config.secret_name()).await?;
        let embedder = EmbeddingClient::new(
            EmbeddingConfig::from_app_config(config)?,
            config.retrieval_timeout(),
        )?;
        let catalog = PgVectorCatalog::connect(config, &credentials, embedder).await?;
        info!("Catalog collection: {}", catalog.collection());

        Ok(Self::new(
            llm.clone(),
            llm,
            Arc::new(catalog),
            PipelineSettings::from_config(config),
        ))
    }
}

/// Sequential recommendation pipeline
#[derive(Clone)]
pub struct RecommendationPipeline {
    vision: VisionStage,
    retriever: Retriever,
    generator: Generator,
    formatter: ResponseFormatter,
}

impl RecommendationPipeline {
    #[must_use]
    pub fn new(context: PipelineContext) -> Self {
        let settings = context.settings;
        Self {
            vision: VisionStage::new(context.vision, settings.vision_timeout),
            retriever: Retriever::new(
                context.catalog,
                settings.top_k,
                settings.retrieval_timeout,
            ),
            generator: Generator::new(
                context.text,
                ContextAssembler::new(settings.max_context_chars),
                settings.generation,
                settings.generation_timeout,
            ),
            formatter: ResponseFormatter::new(settings.tail_window),
        }
    }

    /// Run the pipeline to completion without a cancellation source
    ///
    /// # Errors
    /// - `Pipeline` with the failing stage and a sanitized message
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResult> {
        self.run(request, &CancellationToken::new()).await.result
    }

    /// Run the pipeline, returning both the result and the run trace.
    ///
    /// The token is checked before every stage. A call already in flight is
    /// allowed to finish, but no later stage is started once it fires.
    pub async fn run(
        &self,
        request: &RecommendationRequest,
        cancel: &CancellationToken,
    ) -> PipelineOutcome {
        let mut run = PipelineRun::new();
        let span = info_span!("recommendation", run_id = %run.run_id);
        let started = Instant::now();

        let result = self
            .drive(request, cancel, &mut run)
            .instrument(span.clone())
            .await;

        let _enter = span.enter();
        match &result {
            Ok(output) => {
                run.advance(PipelineState::Completed);
                info!(
                    "Recommendation completed in {:?} with {} product ids",
                    started.elapsed(),
                    output.product_ids.len()
                );
            }
            Err(e) => info!("Recommendation failed after {:?}: {}", started.elapsed(), e),
        }

        PipelineOutcome { run, result }
    }

    async fn drive(
        &self,
        request: &RecommendationRequest,
        cancel: &CancellationToken,
        run: &mut PipelineRun,
    ) -> Result<RecommendationResult> {
        let user_text = request.user_text();

        let description = step(
            run,
            cancel,
            PipelineStage::Describing,
            self.vision.describe(request.image()),
        )
        .await?;

        let docs = step(
            run,
            cancel,
            PipelineStage::Retrieving,
            self.retriever.retrieve(user_text, &description),
        )
        .await?;

        let raw = step(
            run,
            cancel,
            PipelineStage::Generating,
            self.generator.generate(user_text, &description, &docs),
        )
        .await?;

        step(run, cancel, PipelineStage::Formatting, async {
            Ok::<_, ShopAssistError>(self.formatter.format(&raw))
        })
        .await
    }
}

/// Enter a stage and await it, recording the outcome on the run
async fn step<T, F>(
    run: &mut PipelineRun,
    cancel: &CancellationToken,
    stage: PipelineStage,
    work: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if cancel.is_cancelled() {
        return Err(fail(run, stage, ShopAssistError::Cancelled { stage }));
    }

    run.advance(stage.into());
    info!("Entering stage {}", stage);
    let started = Instant::now();

    match work.await {
        Ok(value) => {
            debug!("Stage {} finished in {:?}", stage, started.elapsed());
            Ok(value)
        }
        Err(e) => Err(fail(run, stage, e)),
    }
}

/// Record a failure and convert it to the externally visible error
fn fail(run: &mut PipelineRun, stage: PipelineStage, cause: ShopAssistError) -> ShopAssistError {
    error!("Stage {} failed: {}", stage, cause);
    run.failure = Some(StageFailure {
        stage,
        reason: cause.to_string(),
    });
    run.advance(PipelineState::Failed);

    match cause {
        ShopAssistError::Cancelled { stage } => ShopAssistError::Cancelled { stage },
        _ => ShopAssistError::Pipeline {
            stage,
            message: public_message(stage).to_string(),
        },
    }
}

const fn public_message(stage: PipelineStage) -> &'static str {
    match stage {
        PipelineStage::Describing => "the room description service is unavailable",
        PipelineStage::Retrieving => "the product catalog is unavailable",
        PipelineStage::Generating => "the recommendation service is unavailable",
        PipelineStage::Formatting => "the recommendation could not be formatted",
    }
}
