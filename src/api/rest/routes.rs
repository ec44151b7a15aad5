use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::rest::{handlers, logging_middleware::request_logging_middleware};
use crate::shared::models::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/healthz", get(handlers::health::healthz))
        // Sandbox lifecycle and raw primitives
        .route("/sandboxes", post(handlers::sandboxes::create_sandbox))
        .route(
            "/sandboxes/{id}/files",
            get(handlers::sandboxes::list_files).post(handlers::sandboxes::write_files),
        )
        .route("/sandboxes/{id}/file", get(handlers::sandboxes::read_file))
        .route(
            "/sandboxes/{id}/command",
            post(handlers::sandboxes::execute_command),
        )
        // Agent endpoints, one per configured provider
        .route(
            "/agents/{provider}/{sandbox_id}/code",
            post(handlers::agents::code_agent),
        )
        .route("/agents/{provider}/query", post(handlers::agents::query))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(request_logging_middleware))
        .layer(TraceLayer::new_for_http())
}
