//! Sandbox lifecycle and direct file/command endpoints.
//!
//! The create route is the one the upstream gateway uses to obtain a sandbox
//! id before running agents against it; the remaining routes expose the raw
//! sandbox primitives for development and debugging.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::rest::error::{ApiError, ApiResult};
use crate::sandbox::{DirEntry, WriteConfirmation, WriteEntry};
use crate::shared::models::AppState;

#[derive(Debug, Serialize)]
pub struct CreateSandboxResponse {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PathQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ListSandboxResponse {
    pub path: String,
    pub files: Vec<DirEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReadSandboxResponse {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct WriteSandboxRequest {
    pub write_data: Vec<WriteEntry>,
}

#[derive(Debug, Serialize)]
pub struct WriteSandboxResponse {
    pub files_written_to: Vec<WriteConfirmation>,
    pub write_data: Vec<WriteEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ExecuteCommandRequest {
    pub command: String,
}

#[derive(Debug, Serialize)]
pub struct ExecuteSandboxResponse {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
}

pub async fn create_sandbox(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<CreateSandboxResponse>> {
    info!("sandbox creation started");
    let handle = state
        .sandbox
        .create(&state.settings.sandbox_template_id)
        .await
        .map_err(|e| ApiError::from_agent(e, "failed to create sandbox"))?;
    info!(sandbox_id = %handle.id, "sandbox creation completed");
    Ok(Json(CreateSandboxResponse {
        id: handle.id,
        url: handle.url,
    }))
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Path(sandbox_id): Path<String>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<ListSandboxResponse>> {
    let files = state
        .sandbox
        .list_files(&sandbox_id, &query.path)
        .await
        .map_err(|e| {
            ApiError::from_agent(e, &format!("failed to list files in sandbox '{sandbox_id}'"))
        })?;
    info!(sandbox_id = %sandbox_id, path = %query.path, file_count = files.len(), "file listing completed");
    Ok(Json(ListSandboxResponse {
        path: query.path,
        files,
    }))
}

pub async fn read_file(
    State(state): State<Arc<AppState>>,
    Path(sandbox_id): Path<String>,
    Query(query): Query<PathQuery>,
) -> ApiResult<Json<ReadSandboxResponse>> {
    let content = state
        .sandbox
        .read_file(&sandbox_id, &query.path)
        .await
        .map_err(|e| {
            ApiError::from_agent(e, &format!("failed to read file in sandbox '{sandbox_id}'"))
        })?;
    info!(sandbox_id = %sandbox_id, path = %query.path, content_length = content.len(), "file read completed");
    Ok(Json(ReadSandboxResponse {
        path: query.path,
        content,
    }))
}

pub async fn write_files(
    State(state): State<Arc<AppState>>,
    Path(sandbox_id): Path<String>,
    Json(request): Json<WriteSandboxRequest>,
) -> ApiResult<Json<WriteSandboxResponse>> {
    let written = state
        .sandbox
        .write_files(&sandbox_id, &request.write_data)
        .await
        .map_err(|e| {
            ApiError::from_agent(e, &format!("failed to write files in sandbox '{sandbox_id}'"))
        })?;
    info!(
        sandbox_id = %sandbox_id,
        files_requested = request.write_data.len(),
        files_written = written.len(),
        "file write completed"
    );
    Ok(Json(WriteSandboxResponse {
        files_written_to: written,
        write_data: request.write_data,
    }))
}

pub async fn execute_command(
    State(state): State<Arc<AppState>>,
    Path(sandbox_id): Path<String>,
    Json(request): Json<ExecuteCommandRequest>,
) -> ApiResult<Json<ExecuteSandboxResponse>> {
    let output = state
        .sandbox
        .run_command(&sandbox_id, &request.command)
        .await
        .map_err(|e| {
            ApiError::from_agent(
                e,
                &format!("failed to execute command in sandbox '{sandbox_id}'"),
            )
        })?;
    info!(
        sandbox_id = %sandbox_id,
        command = %request.command,
        stdout_length = output.stdout.len(),
        stderr_length = output.stderr.len(),
        "command execution completed"
    );
    Ok(Json(ExecuteSandboxResponse {
        command: request.command,
        stdout: output.stdout,
        stderr: output.stderr,
    }))
}
