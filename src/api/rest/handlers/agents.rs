//! Code-agent and query endpoints, one route per provider.
//!
//! The coordinators are written once against the `ModelClient` interface;
//! the `{provider}` path segment only selects which configured client backs
//! the run.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

use crate::agent::{CodeAgentCoordinator, QueryCoordinator};
use crate::api::rest::error::{ApiError, ApiResult};
use crate::shared::models::AppState;

#[derive(Debug, Deserialize)]
pub struct CodeAgentRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CodeAgentResponse {
    pub human_message: String,
    pub summary: String,
    pub commands: Vec<String>,
    pub files: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub content: String,
}

fn resolve_model(
    state: &AppState,
    provider: &str,
) -> ApiResult<Arc<dyn crate::agent::providers::ModelClient>> {
    state.model(provider).ok_or_else(|| {
        ApiError::NotFound(format!("unknown or unconfigured provider '{provider}'"))
    })
}

pub async fn code_agent(
    State(state): State<Arc<AppState>>,
    Path((provider, sandbox_id)): Path<(String, String)>,
    Json(request): Json<CodeAgentRequest>,
) -> ApiResult<Json<CodeAgentResponse>> {
    let model = resolve_model(&state, &provider)?;
    info!(
        provider = %provider,
        sandbox_id = %sandbox_id,
        message_length = request.message.len(),
        "code agent run started"
    );

    let coordinator = CodeAgentCoordinator::new(model, state.sandbox.clone());
    let result = coordinator
        .run(&sandbox_id, &request.message)
        .await
        .map_err(|e| {
            error!(provider = %provider, sandbox_id = %sandbox_id, error = %e, "code agent run failed");
            ApiError::from_agent(
                e,
                &format!("{provider} code agent failed for sandbox '{sandbox_id}'"),
            )
        })?;

    info!(
        provider = %provider,
        sandbox_id = %sandbox_id,
        commands_executed = result.commands.len(),
        files_modified = result.files.len(),
        "code agent run completed"
    );
    Ok(Json(CodeAgentResponse {
        human_message: request.message,
        summary: result.summary,
        commands: result.commands,
        files: result.files,
    }))
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(request): Json<QueryRequest>,
) -> ApiResult<Json<QueryResponse>> {
    let model = resolve_model(&state, &provider)?;
    info!(provider = %provider, message_length = request.message.len(), "query started");

    let coordinator = QueryCoordinator::new(model);
    let content = coordinator.run(&request.message).await.map_err(|e| {
        error!(provider = %provider, error = %e, "query failed");
        ApiError::from_agent(e, &format!("{provider} query failed"))
    })?;

    info!(provider = %provider, "query completed");
    Ok(Json(QueryResponse { content }))
}
