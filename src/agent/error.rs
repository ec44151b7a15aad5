use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("model error: {0}")]
    Model(String),

    #[error("model returned unparseable output: {0}")]
    ModelOutput(String),

    #[error("sandbox error: {0}")]
    Sandbox(String),

    #[error("path '{0}' is not permitted")]
    ForbiddenPath(String),

    #[error("guardrail violation: {0}")]
    Guardrail(String),

    #[error("invalid tool arguments: {0}")]
    Arguments(String),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
