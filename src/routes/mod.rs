use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    services::ModelCache,
};

pub mod recommendations;
pub mod stats;
pub mod titles;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub models: Arc<ModelCache>,
    /// Recommendations returned when a request does not ask for a count
    pub default_count: usize,
    pub max_count: usize,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/titles/search", get(titles::search))
        .route("/stats", get(stats::stats))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
