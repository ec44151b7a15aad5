use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use std::time::Instant;
use tracing::info;
use uuid::Uuid;

pub async fn request_logging_middleware(
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start_time = Instant::now();

    info!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        "request received"
    );

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    info!(
        request_id = %request_id,
        method = %method,
        path = %uri.path(),
        status = %response.status(),
        duration_ms = %duration.as_millis(),
        "request completed"
    );

    Ok(response)
}
