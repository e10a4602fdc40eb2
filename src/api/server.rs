//! HTTP server implementation

use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::config::AppConfig;
use crate::rag::PipelineContext;
use crate::rag::RecommendationPipeline;
use crate::secrets::SecretStore;
use crate::Result;

/// Assemble the application router with its middleware
pub fn build_router(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .merge(routes::chat_routes(state.clone()))
        .nest("/api", routes::api_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        info!("✅ CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Start the API server
pub async fn serve_api(
    config: &AppConfig,
    secrets: &dyn SecretStore,
    host: String,
    port: u16,
    enable_cors: bool,
) -> Result<()> {
    info!("🚀 Starting shop assistant API server...");

    // Clients and credentials are resolved once and shared by every request
    let context = PipelineContext::from_config(config, secrets).await?;
    let state = AppState::new(
        RecommendationPipeline::new(context),
        config.request_deadline(),
    );
    let app = build_router(state, enable_cors);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🌐 API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  POST /                - Chat recommendation");
    info!("  POST /api/recommend   - Structured recommendation");
    info!("  GET  /api/health      - Health check");

    axum::serve(listener, app).await?;

    Ok(())
}
