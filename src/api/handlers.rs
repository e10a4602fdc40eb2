//! API request handlers

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing::warn;

use crate::api::types::ApiResponse;
use crate::api::types::ChatRequest;
use crate::api::types::ChatResponse;
use crate::api::types::HealthResponse;
use crate::api::types::RecommendResponse;
use crate::errors::ShopAssistError;
use crate::models::RecommendationRequest;
use crate::models::RecommendationResult;
use crate::rag::RecommendationPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RecommendationPipeline>,
    /// Once elapsed, no further pipeline stage is started
    pub request_deadline: Duration,
}

impl AppState {
    pub fn new(pipeline: RecommendationPipeline, request_deadline: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            request_deadline,
        }
    }
}

/// Error response carrying a pipeline failure
#[derive(Debug)]
pub struct ApiError(pub ShopAssistError);

impl From<ShopAssistError> for ApiError {
    fn from(err: ShopAssistError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ShopAssistError::InvalidRequest(rejection.body_text()))
    }
}

impl ApiError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match &self.0 {
            ShopAssistError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ShopAssistError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("Request failed with {}: {}", status, self.0);
        (status, Json(ApiResponse::<()>::error(self.0.to_string()))).into_response()
    }
}

/// Health check handler
pub async fn health() -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// Storefront chat (POST /)
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    info!("POST / (image: {})", req.image.is_some());
    let result = run_request(&state, &req).await?;
    Ok(Json(ChatResponse {
        content: result.narrative,
    }))
}

/// Structured recommendation (POST /api/recommend)
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<RecommendResponse>>, ApiError> {
    let Json(req) = payload?;
    info!("POST /api/recommend (image: {})", req.image.is_some());
    let result = run_request(&state, &req).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

async fn run_request(state: &AppState, req: &ChatRequest) -> Result<RecommendationResult, ApiError> {
    let request = RecommendationRequest::from_wire(&req.message, req.image.as_deref())?;

    let cancel = CancellationToken::new();
    // Fires when the handler finishes or is dropped on disconnect, ending the timer
    let _release = cancel.clone().drop_guard();
    spawn_deadline(&cancel, state.request_deadline);

    let outcome = state.pipeline.run(&request, &cancel).await;
    Ok(outcome.result?)
}

/// Cancel `cancel` once `after` elapses; the task exits early if the token fires first
pub(crate) fn spawn_deadline(cancel: &CancellationToken, after: Duration) -> JoinHandle<()> {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = cancel.cancelled() => {}
            () = tokio::time::sleep(after) => cancel.cancel(),
        }
    })
}
