//! Mock generation and catalog services with call counters

#![allow(dead_code)]

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use shopassist::catalog::CatalogStore;
use shopassist::llm::TextGeneration;
use shopassist::llm::VisionGeneration;
use shopassist::models::CatalogDocument;
use shopassist::models::RoomImage;
use shopassist::rag::PipelineContext;
use shopassist::rag::PipelineSettings;
use shopassist::rag::RecommendationPipeline;
use shopassist::Result;
use shopassist::ShopAssistError;
use tokio_util::sync::CancellationToken;

pub const ROOM_DESCRIPTION: &str = "A bohemian living room with warm wood tones and rattan accents";

pub const RUG_REPLY: &str = "For your bohemian living room a textured jute rug grounds the space, \
and a round wool rug softens the reading corner.\n\n[RUG1], [RUG2]";

/// How a mock responds to a call
#[derive(Clone)]
pub enum Behavior {
    Reply(String),
    Fail(String),
    /// Sleep, then reply
    Hang(Duration),
}

impl Behavior {
    async fn act(&self) -> std::result::Result<String, String> {
        match self {
            Self::Reply(text) => Ok(text.clone()),
            Self::Fail(reason) => Err(reason.clone()),
            Self::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".to_string())
            }
        }
    }
}

pub struct MockVision {
    pub calls: AtomicUsize,
    pub behavior: Behavior,
    pub saw_image: Mutex<Option<bool>>,
    /// Fired while the call is in flight
    pub cancel_on_call: Option<CancellationToken>,
}

impl MockVision {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            behavior,
            saw_image: Mutex::new(None),
            cancel_on_call: None,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionGeneration for MockVision {
    async fn complete_with_image(&self, _message: &str, image: Option<&RoomImage>) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.saw_image.lock().unwrap() = Some(image.is_some());
        if let Some(token) = &self.cancel_on_call {
            token.cancel();
        }
        self.behavior.act().await.map_err(ShopAssistError::LlmError)
    }
}

pub struct MockText {
    pub calls: AtomicUsize,
    pub behavior: Behavior,
    pub last_prompt: Mutex<Option<String>>,
}

impl MockText {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            behavior,
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.last_prompt.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl TextGeneration for MockText {
    async fn complete(&self, prompt: &str, _max_tokens: usize, _temperature: f32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.behavior.act().await.map_err(ShopAssistError::LlmError)
    }
}

pub struct MockCatalog {
    pub calls: AtomicUsize,
    pub docs: Vec<CatalogDocument>,
    pub failure: Option<String>,
    pub delay: Option<Duration>,
    pub last_query: Mutex<Option<(String, usize)>>,
}

impl MockCatalog {
    pub fn with_docs(docs: Vec<CatalogDocument>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            docs,
            failure: None,
            delay: None,
            last_query: Mutex::new(None),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            failure: Some(reason.to_string()),
            ..Self::with_docs(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<(String, usize)> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogStore for MockCatalog {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<CatalogDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some((query.to_string(), k));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(reason) => Err(ShopAssistError::Retrieval(reason.clone())),
            None => Ok(self.docs.clone()),
        }
    }
}

pub fn rug_docs() -> Vec<CatalogDocument> {
    vec![
        CatalogDocument::new(
            "RUG1",
            "id: RUG1, name: Jute Area Rug, description: Hand-woven natural jute, categories: home",
        ),
        CatalogDocument::new(
            "RUG2",
            "id: RUG2, name: Round Wool Rug, description: Soft cream wool with fringe, categories: home",
        ),
    ]
}

/// Mocks plus the pipeline wired over them
pub struct Harness {
    pub vision: Arc<MockVision>,
    pub text: Arc<MockText>,
    pub catalog: Arc<MockCatalog>,
    pub pipeline: RecommendationPipeline,
}

impl Harness {
    pub fn new(vision: MockVision, text: MockText, catalog: MockCatalog) -> Self {
        Self::with_settings(vision, text, catalog, PipelineSettings::default())
    }

    pub fn with_settings(
        vision: MockVision,
        text: MockText,
        catalog: MockCatalog,
        settings: PipelineSettings,
    ) -> Self {
        let vision = Arc::new(vision);
        let text = Arc::new(text);
        let catalog = Arc::new(catalog);
        let pipeline = RecommendationPipeline::new(PipelineContext::new(
            vision.clone(),
            text.clone(),
            catalog.clone(),
            settings,
        ));
        Self {
            vision,
            text,
            catalog,
            pipeline,
        }
    }

    /// Happy-path mocks for the "add a rug" scenario
    pub fn rugs() -> Self {
        Self::new(
            MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string())),
            MockText::new(Behavior::Reply(RUG_REPLY.to_string())),
            MockCatalog::with_docs(rug_docs()),
        )
    }
}
