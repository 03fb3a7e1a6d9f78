//! API module for handling HTTP requests and responses

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::state::AppState;

use handlers::{match_upload, match_url};
use responses::HealthResponse;

/// Create the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    // Permissive CORS so the frontend can call the API from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Unmatched paths fall through to the static frontend
    let frontend = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/upload", post(match_upload))
        .route("/api/url", post(match_url))
        .fallback_service(frontend)
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
