//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Storefront chat route, mounted at the root
pub fn chat_routes(state: AppState) -> Router {
    Router::new()
        .route("/", post(handlers::chat))
        .with_state(state)
}

/// RESTful API router, mounted under `/api`
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/recommend", post(handlers::recommend))
        .with_state(state)
}
