use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::agent::error::{AgentError, Result};

use super::{CommandOutput, DirEntry, SandboxApi, SandboxHandle, WriteConfirmation, WriteEntry};

/// HTTP client for the sandbox runtime.
///
/// Sandboxes are ephemeral; an identifier may expire at any time, so every
/// file or command operation resolves the session first and reports a
/// resolution failure as a descriptive sandbox error.
pub struct HttpSandboxClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct CreateSandboxBody<'a> {
    template_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RunCommandBody<'a> {
    command: &'a str,
}

#[derive(Debug, Serialize)]
struct WriteFilesBody<'a> {
    files: &'a [WriteEntry],
}

#[derive(Debug, Deserialize)]
struct ReadFileResponse {
    content: String,
}

impl HttpSandboxClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| AgentError::Sandbox(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Check that the session behind `sandbox_id` is still alive.
    async fn resolve(&self, sandbox_id: &str) -> Result<()> {
        let resp = self
            .http
            .get(self.url(&format!("/sandboxes/{sandbox_id}")))
            .header("X-API-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| AgentError::Sandbox(format!("failed to reach sandbox runtime: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AgentError::Sandbox(format!(
                "failed to resolve sandbox '{sandbox_id}' ({status}): {body}"
            )));
        }
        debug!(sandbox_id, "sandbox session resolved");
        Ok(())
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
        what: &str,
    ) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AgentError::Sandbox(format!(
                "failed to {what} ({status}): {body}"
            )));
        }
        resp.json::<T>()
            .await
            .map_err(|e| AgentError::Sandbox(format!("invalid response while trying to {what}: {e}")))
    }
}

#[async_trait]
impl SandboxApi for HttpSandboxClient {
    async fn create(&self, template: &str) -> Result<SandboxHandle> {
        info!(template, "creating sandbox");
        let resp = self
            .http
            .post(self.url("/sandboxes"))
            .header("X-API-Key", &self.api_key)
            .json(&CreateSandboxBody {
                template_id: template,
            })
            .send()
            .await
            .map_err(|e| AgentError::Sandbox(format!("failed to create sandbox: {e}")))?;
        let handle: SandboxHandle = Self::decode(resp, "create sandbox").await?;
        info!(sandbox_id = %handle.id, "sandbox created");
        Ok(handle)
    }

    async fn list_files(&self, sandbox_id: &str, path: &str) -> Result<Vec<DirEntry>> {
        self.resolve(sandbox_id).await?;
        let resp = self
            .http
            .get(self.url(&format!("/sandboxes/{sandbox_id}/files")))
            .header("X-API-Key", &self.api_key)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| AgentError::Sandbox(format!("failed to list files at '{path}': {e}")))?;
        Self::decode(resp, &format!("list files at '{path}'")).await
    }

    async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<String> {
        self.resolve(sandbox_id).await?;
        let resp = self
            .http
            .get(self.url(&format!("/sandboxes/{sandbox_id}/file")))
            .header("X-API-Key", &self.api_key)
            .query(&[("path", path)])
            .send()
            .await
            .map_err(|e| AgentError::Sandbox(format!("failed to read file '{path}': {e}")))?;
        let body: ReadFileResponse = Self::decode(resp, &format!("read file '{path}'")).await?;
        Ok(body.content)
    }

    async fn write_files(
        &self,
        sandbox_id: &str,
        entries: &[WriteEntry],
    ) -> Result<Vec<WriteConfirmation>> {
        self.resolve(sandbox_id).await?;
        let resp = self
            .http
            .put(self.url(&format!("/sandboxes/{sandbox_id}/files")))
            .header("X-API-Key", &self.api_key)
            .json(&WriteFilesBody { files: entries })
            .send()
            .await
            .map_err(|e| {
                AgentError::Sandbox(format!("failed to write {} file(s): {e}", entries.len()))
            })?;
        Self::decode(resp, &format!("write {} file(s)", entries.len())).await
    }

    async fn run_command(&self, sandbox_id: &str, command: &str) -> Result<CommandOutput> {
        self.resolve(sandbox_id).await?;
        let resp = self
            .http
            .post(self.url(&format!("/sandboxes/{sandbox_id}/commands")))
            .header("X-API-Key", &self.api_key)
            .json(&RunCommandBody { command })
            .send()
            .await
            .map_err(|e| AgentError::Sandbox(format!("failed to run command: {e}")))?;
        Self::decode(resp, "run command").await
    }
}
