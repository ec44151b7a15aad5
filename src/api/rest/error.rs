use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::agent::AgentError;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Forbidden(String),
    NotFound(String),
    Upstream(String),
    Internal(anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Map an agent error into an API error, prefixing the request context
    /// so a failed run never surfaces as a bare internal error.
    pub fn from_agent(err: AgentError, context: &str) -> Self {
        let message = format!("{context}: {err}");
        match err {
            AgentError::Guardrail(_) | AgentError::Arguments(_) => ApiError::BadRequest(message),
            AgentError::ForbiddenPath(_) => ApiError::Forbidden(message),
            AgentError::Sandbox(_) => ApiError::Upstream(message),
            _ => ApiError::Internal(anyhow::anyhow!(message)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", e),
            ),
        };
        (status, Json(ErrorResponse { message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_errors_map_to_status_classes() {
        let cases = [
            (
                ApiError::from_agent(AgentError::Guardrail("too long".into()), "ctx"),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from_agent(AgentError::ForbiddenPath("/etc".into()), "ctx"),
                StatusCode::FORBIDDEN,
            ),
            (
                ApiError::from_agent(AgentError::Sandbox("expired".into()), "ctx"),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError::from_agent(AgentError::Model("down".into()), "ctx"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
