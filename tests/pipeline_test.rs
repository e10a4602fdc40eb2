mod common;

use std::time::Duration;

use common::*;
use shopassist::models::PipelineStage;
use shopassist::models::RecommendationRequest;
use shopassist::models::RoomImage;
use shopassist::rag::context::NO_CANDIDATES_MARKER;
use shopassist::rag::PipelineSettings;
use shopassist::rag::PipelineState;
use shopassist::Result;
use shopassist::ShopAssistError;
use tokio_util::sync::CancellationToken;

fn rug_request() -> RecommendationRequest {
    RecommendationRequest::new(
        "I want to add a rug",
        Some(RoomImage::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3])),
    )
    .unwrap()
}

const FULL_RUN: [PipelineState; 6] = [
    PipelineState::Received,
    PipelineState::Describing,
    PipelineState::Retrieving,
    PipelineState::Generating,
    PipelineState::Formatting,
    PipelineState::Completed,
];

#[tokio::test]
async fn test_add_a_rug_end_to_end() -> Result<()> {
    let harness = Harness::rugs();

    let outcome = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;
    let result = outcome.result?;

    assert_eq!(result.product_ids, vec!["RUG1", "RUG2"]);
    assert_eq!(result.narrative, RUG_REPLY);
    assert!(!result.display_text.contains("[RUG1]"));
    assert_eq!(outcome.run.history, FULL_RUN);
    assert!(outcome.run.failure.is_none());

    assert_eq!(harness.vision.calls(), 1);
    assert_eq!(*harness.vision.saw_image.lock().unwrap(), Some(true));
    assert_eq!(harness.catalog.calls(), 1);
    assert_eq!(harness.text.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_retrieval_query_combines_request_and_style() {
    let harness = Harness::rugs();
    harness.pipeline.recommend(&rug_request()).await.unwrap();

    let (query, k) = harness.catalog.last_query().unwrap();
    assert!(query.contains("I want to add a rug"));
    assert!(query.contains(ROOM_DESCRIPTION));
    assert_eq!(k, 4);
}

#[tokio::test]
async fn test_generation_prompt_carries_every_input() {
    let harness = Harness::rugs();
    harness.pipeline.recommend(&rug_request()).await.unwrap();

    let prompt = harness.text.last_prompt();
    assert!(prompt.contains(ROOM_DESCRIPTION));
    assert!(prompt.contains("Jute Area Rug"));
    assert!(prompt.contains("Round Wool Rug"));
    assert!(prompt.contains("I want to add a rug"));
    assert!(prompt.contains("[<first product ID>]"));

    let description_at = prompt.find(ROOM_DESCRIPTION).unwrap();
    let candidates_at = prompt.find("Jute Area Rug").unwrap();
    let request_at = prompt.rfind("I want to add a rug").unwrap();
    assert!(description_at < candidates_at);
    assert!(candidates_at < request_at);
}

#[tokio::test]
async fn test_request_without_image_still_describes() {
    let harness = Harness::rugs();
    let request = RecommendationRequest::new("a lamp for reading", None).unwrap();

    let result = harness.pipeline.recommend(&request).await.unwrap();

    assert_eq!(harness.vision.calls(), 1);
    assert_eq!(*harness.vision.saw_image.lock().unwrap(), Some(false));
    assert_eq!(result.product_ids.len(), 2);
}

#[tokio::test]
async fn test_empty_retrieval_is_not_an_error() {
    let harness = Harness::new(
        MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string())),
        MockText::new(Behavior::Reply(
            "I could not find any matching rugs in our catalog right now.".to_string(),
        )),
        MockCatalog::with_docs(Vec::new()),
    );

    let outcome = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;

    let result = outcome.result.unwrap();
    assert!(result.product_ids.is_empty());
    assert!(harness.text.last_prompt().contains(NO_CANDIDATES_MARKER));
    assert_eq!(outcome.run.state(), PipelineState::Completed);
}

#[tokio::test]
async fn test_product_ids_capped_at_three() {
    let harness = Harness::new(
        MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string())),
        MockText::new(Behavior::Reply(
            "Plenty of options here.\n[A1], [B2], [C3], [D4]".to_string(),
        )),
        MockCatalog::with_docs(rug_docs()),
    );

    let result = harness.pipeline.recommend(&rug_request()).await.unwrap();
    assert_eq!(result.product_ids, vec!["A1", "B2", "C3"]);
}

#[tokio::test]
async fn test_vision_failure_stops_pipeline() {
    let harness = Harness::new(
        MockVision::new(Behavior::Fail("model overloaded".to_string())),
        MockText::new(Behavior::Reply(RUG_REPLY.to_string())),
        MockCatalog::with_docs(rug_docs()),
    );

    let outcome = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;

    let err = outcome.result.unwrap_err();
    assert!(matches!(
        err,
        ShopAssistError::Pipeline {
            stage: PipelineStage::Describing,
            ..
        }
    ));
    assert!(!err.to_string().contains("overloaded"));
    assert_eq!(outcome.run.state(), PipelineState::Failed);
    let failure = outcome.run.failure.unwrap();
    assert_eq!(failure.stage, PipelineStage::Describing);
    assert!(failure.reason.contains("model overloaded"));

    assert_eq!(harness.catalog.calls(), 0);
    assert_eq!(harness.text.calls(), 0);
}

#[tokio::test]
async fn test_retrieval_failure_stops_pipeline() {
    let harness = Harness::new(
        MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string())),
        MockText::new(Behavior::Reply(RUG_REPLY.to_string())),
        MockCatalog::failing("connection refused"),
    );

    let outcome = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;

    assert!(matches!(
        outcome.result,
        Err(ShopAssistError::Pipeline {
            stage: PipelineStage::Retrieving,
            ..
        })
    ));
    assert!(!outcome.run.entered(PipelineStage::Generating));
    assert_eq!(harness.text.calls(), 0);
}

#[tokio::test]
async fn test_generation_failure_returns_no_partial_result() {
    let harness = Harness::new(
        MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string())),
        MockText::new(Behavior::Fail("throttled".to_string())),
        MockCatalog::with_docs(rug_docs()),
    );

    let outcome = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;

    assert!(matches!(
        outcome.result,
        Err(ShopAssistError::Pipeline {
            stage: PipelineStage::Generating,
            ..
        })
    ));
    assert!(!outcome.run.entered(PipelineStage::Formatting));
    assert_eq!(harness.vision.calls(), 1);
    assert_eq!(harness.catalog.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_vision_timeout_is_stage_error() {
    let settings = PipelineSettings {
        vision_timeout: Duration::from_millis(50),
        ..PipelineSettings::default()
    };
    let harness = Harness::with_settings(
        MockVision::new(Behavior::Hang(Duration::from_secs(30))),
        MockText::new(Behavior::Reply(RUG_REPLY.to_string())),
        MockCatalog::with_docs(rug_docs()),
        settings,
    );

    let outcome = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;

    assert!(matches!(
        outcome.result,
        Err(ShopAssistError::Pipeline {
            stage: PipelineStage::Describing,
            ..
        })
    ));
    assert!(outcome.run.failure.unwrap().reason.contains("timed out"));
    assert_eq!(harness.catalog.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_retrieval_timeout_is_stage_error() {
    let settings = PipelineSettings {
        retrieval_timeout: Duration::from_millis(50),
        ..PipelineSettings::default()
    };
    let mut catalog = MockCatalog::with_docs(rug_docs());
    catalog.delay = Some(Duration::from_secs(30));
    let harness = Harness::with_settings(
        MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string())),
        MockText::new(Behavior::Reply(RUG_REPLY.to_string())),
        catalog,
        settings,
    );

    let result = harness.pipeline.recommend(&rug_request()).await;

    assert!(matches!(
        result,
        Err(ShopAssistError::Pipeline {
            stage: PipelineStage::Retrieving,
            ..
        })
    ));
    assert_eq!(harness.text.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_before_start_invokes_nothing() {
    let harness = Harness::rugs();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = harness.pipeline.run(&rug_request(), &cancel).await;

    assert!(matches!(
        outcome.result,
        Err(ShopAssistError::Cancelled {
            stage: PipelineStage::Describing
        })
    ));
    assert_eq!(
        outcome.run.history,
        vec![PipelineState::Received, PipelineState::Failed]
    );
    assert_eq!(harness.vision.calls(), 0);
}

#[tokio::test]
async fn test_cancel_mid_run_suppresses_later_stages() {
    let cancel = CancellationToken::new();
    let mut vision = MockVision::new(Behavior::Reply(ROOM_DESCRIPTION.to_string()));
    vision.cancel_on_call = Some(cancel.clone());
    let harness = Harness::new(
        vision,
        MockText::new(Behavior::Reply(RUG_REPLY.to_string())),
        MockCatalog::with_docs(rug_docs()),
    );

    let outcome = harness.pipeline.run(&rug_request(), &cancel).await;

    assert!(matches!(
        outcome.result,
        Err(ShopAssistError::Cancelled {
            stage: PipelineStage::Retrieving
        })
    ));
    assert_eq!(harness.vision.calls(), 1);
    assert_eq!(harness.catalog.calls(), 0);
    assert_eq!(harness.text.calls(), 0);
}

#[tokio::test]
async fn test_runs_are_independent() {
    let harness = Harness::rugs();

    let first = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;
    let second = harness
        .pipeline
        .run(&rug_request(), &CancellationToken::new())
        .await;

    assert_ne!(first.run.run_id, second.run.run_id);
    assert_eq!(first.result.unwrap(), second.result.unwrap());
    assert_eq!(second.run.history, FULL_RUN);
    assert_eq!(harness.text.calls(), 2);
}
