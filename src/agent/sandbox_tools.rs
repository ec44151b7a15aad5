//! The fixed tool set a code agent may drive against one sandbox.
//!
//! Each tool validates its arguments against a serde contract, delegates to
//! the sandbox collaborator, and renders the outcome as text for the model.
//! Only `write_files` and `run_command` mutate the sandbox; they carry the
//! matching `ToolEffect` so the recorder knows what to stage.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

use crate::sandbox::{SandboxApi, WriteEntry};

use super::error::{AgentError, Result};
use super::outcome::ToolOutput;
use super::tool_registry::{Tool, ToolEffect, ToolRegistry};

/// Root-level paths the agent may never list. Checked before any remote call.
static FORBIDDEN_PATHS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["/", "/root", "/etc", "/sys", "/proc"]));

fn check_listable(path: &str) -> Result<()> {
    let trimmed = if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    };
    if FORBIDDEN_PATHS.contains(trimmed) {
        return Err(AgentError::ForbiddenPath(path.to_string()));
    }
    Ok(())
}

fn parse_args<T: serde::de::DeserializeOwned>(args: &serde_json::Value) -> Result<T> {
    serde_json::from_value(args.clone()).map_err(|e| AgentError::Arguments(e.to_string()))
}

/// Build the tool set for one run, bound to one sandbox session.
pub fn build_toolset(sandbox: Arc<dyn SandboxApi>, sandbox_id: &str) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ListFilesTool {
        sandbox: sandbox.clone(),
        sandbox_id: sandbox_id.to_string(),
    }));
    registry.register(Box::new(ReadFileTool {
        sandbox: sandbox.clone(),
        sandbox_id: sandbox_id.to_string(),
    }));
    registry.register(Box::new(WriteFilesTool {
        sandbox: sandbox.clone(),
        sandbox_id: sandbox_id.to_string(),
    }));
    registry.register(Box::new(RunCommandTool {
        sandbox,
        sandbox_id: sandbox_id.to_string(),
    }));
    registry
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    path: String,
}

pub struct ListFilesTool {
    sandbox: Arc<dyn SandboxApi>,
    sandbox_id: String,
}

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List the files and directories under a path in the sandbox."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Absolute directory path to list"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput> {
        let args: ListArgs = parse_args(args)?;
        check_listable(&args.path)?;
        info!(tool = "list_files", path = %args.path, "tool start");
        let entries = self.sandbox.list_files(&self.sandbox_id, &args.path).await?;
        info!(tool = "list_files", path = %args.path, entries = entries.len(), "tool end");
        if entries.is_empty() {
            return Ok(ToolOutput::success(format!("no entries under {}", args.path)));
        }
        let listing = entries
            .iter()
            .map(|e| format!("[{}] {}", e.kind, e.path))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ToolOutput::success(listing))
    }
}

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: String,
}

pub struct ReadFileTool {
    sandbox: Arc<dyn SandboxApi>,
    sandbox_id: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the content of one file in the sandbox."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Absolute path of the file to read"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput> {
        let args: ReadArgs = parse_args(args)?;
        info!(tool = "read_file", path = %args.path, "tool start");
        let content = self.sandbox.read_file(&self.sandbox_id, &args.path).await?;
        info!(tool = "read_file", path = %args.path, bytes = content.len(), "tool end");
        Ok(ToolOutput::success(content))
    }
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    write_data: Vec<WriteEntry>,
}

pub struct WriteFilesTool {
    sandbox: Arc<dyn SandboxApi>,
    sandbox_id: String,
}

#[async_trait]
impl Tool for WriteFilesTool {
    fn name(&self) -> &str {
        "write_files"
    }

    fn description(&self) -> &str {
        "Write one or more files in the sandbox. Existing files are overwritten."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "write_data": {
                    "type": "array",
                    "description": "Files to write",
                    "items": {
                        "type": "object",
                        "properties": {
                            "path": {"type": "string", "description": "File path to write to"},
                            "data": {"type": "string", "description": "Content to write"}
                        },
                        "required": ["path", "data"]
                    }
                }
            },
            "required": ["write_data"]
        })
    }

    fn effect(&self) -> ToolEffect {
        ToolEffect::WritesFiles
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput> {
        let args: WriteArgs = parse_args(args)?;
        if args.write_data.is_empty() {
            return Err(AgentError::Arguments("write_data must not be empty".into()));
        }
        info!(tool = "write_files", files = args.write_data.len(), "tool start");
        let confirmations = self
            .sandbox
            .write_files(&self.sandbox_id, &args.write_data)
            .await?;
        info!(tool = "write_files", written = confirmations.len(), "tool end");
        let paths = confirmations
            .iter()
            .map(|c| c.path.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ToolOutput::success(format!(
            "wrote {} file(s): {paths}",
            confirmations.len()
        )))
    }
}

#[derive(Debug, Deserialize)]
struct RunArgs {
    command: String,
}

pub struct RunCommandTool {
    sandbox: Arc<dyn SandboxApi>,
    sandbox_id: String,
}

#[async_trait]
impl Tool for RunCommandTool {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the sandbox and return its output."
    }

    fn parameters(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Shell command to execute"}
            },
            "required": ["command"]
        })
    }

    fn effect(&self) -> ToolEffect {
        ToolEffect::RunsCommand
    }

    async fn execute(&self, args: &serde_json::Value) -> Result<ToolOutput> {
        let args: RunArgs = parse_args(args)?;
        if args.command.trim().is_empty() {
            return Err(AgentError::Arguments("command must not be empty".into()));
        }
        info!(tool = "run_command", command = %args.command, "tool start");
        let out = self
            .sandbox
            .run_command(&self.sandbox_id, &args.command)
            .await?;
        info!(
            tool = "run_command",
            command = %args.command,
            stdout_len = out.stdout.len(),
            stderr_len = out.stderr.len(),
            "tool end"
        );
        let mut text = String::new();
        if !out.stdout.is_empty() {
            text.push_str(&out.stdout);
        }
        if !out.stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str("[stderr]\n");
            text.push_str(&out.stderr);
        }
        if text.is_empty() {
            text.push_str("(no output)");
        }
        // Whether the command semantically succeeded is only visible in its
        // output; leave classification to the outcome policy.
        Ok(ToolOutput::unknown(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::outcome::OutcomeStatus;
    use crate::sandbox::mock::MockSandbox;
    use crate::sandbox::CommandOutput;
    use serde_json::json;

    #[tokio::test]
    async fn forbidden_path_is_rejected_before_any_remote_call() {
        let sandbox = Arc::new(MockSandbox::new());
        let tool = ListFilesTool {
            sandbox: sandbox.clone(),
            sandbox_id: "sbx-1".into(),
        };

        for path in ["/", "/root", "/etc", "/sys", "/proc", "/etc/"] {
            let err = tool.execute(&json!({"path": path})).await.unwrap_err();
            assert!(matches!(err, AgentError::ForbiddenPath(_)), "path {path}");
        }
        assert_eq!(sandbox.call_count(), 0);
    }

    #[tokio::test]
    async fn list_files_formats_entries() {
        let sandbox = Arc::new(MockSandbox::new());
        sandbox
            .files
            .lock()
            .unwrap()
            .insert("/home/user/app/page.tsx".into(), "content".into());
        let tool = ListFilesTool {
            sandbox,
            sandbox_id: "sbx-1".into(),
        };

        let out = tool.execute(&json!({"path": "/home/user"})).await.unwrap();
        assert_eq!(out.status, OutcomeStatus::Success);
        assert!(out.text.contains("[file] /home/user/app/page.tsx"));
    }

    #[tokio::test]
    async fn write_files_reports_confirmations() {
        let sandbox = Arc::new(MockSandbox::new());
        let tool = WriteFilesTool {
            sandbox: sandbox.clone(),
            sandbox_id: "sbx-1".into(),
        };

        let out = tool
            .execute(&json!({"write_data": [
                {"path": "a.txt", "data": "x"},
                {"path": "b.txt", "data": "y"}
            ]}))
            .await
            .unwrap();
        assert_eq!(out.status, OutcomeStatus::Success);
        assert!(out.text.starts_with("wrote 2 file(s)"));
        assert_eq!(
            sandbox.files.lock().unwrap().get("a.txt").map(String::as_str),
            Some("x")
        );
    }

    #[tokio::test]
    async fn run_command_output_is_unclassified() {
        let sandbox = Arc::new(MockSandbox::with_command_outputs(vec![CommandOutput {
            stdout: "added 1 package".into(),
            stderr: "npm warn deprecated".into(),
        }]));
        let tool = RunCommandTool {
            sandbox,
            sandbox_id: "sbx-1".into(),
        };

        let out = tool.execute(&json!({"command": "npm install foo"})).await.unwrap();
        assert_eq!(out.status, OutcomeStatus::Unknown);
        assert!(out.text.contains("added 1 package"));
        assert!(out.text.contains("[stderr]\nnpm warn deprecated"));
    }

    #[tokio::test]
    async fn malformed_arguments_are_rejected() {
        let sandbox = Arc::new(MockSandbox::new());
        let tool = WriteFilesTool {
            sandbox: sandbox.clone(),
            sandbox_id: "sbx-1".into(),
        };

        let err = tool.execute(&json!({"write_data": "oops"})).await.unwrap_err();
        assert!(matches!(err, AgentError::Arguments(_)));
        assert_eq!(sandbox.call_count(), 0);
    }

    #[tokio::test]
    async fn toolset_carries_declared_effects() {
        let sandbox: Arc<dyn SandboxApi> = Arc::new(MockSandbox::new());
        let registry = build_toolset(sandbox, "sbx-1");

        assert_eq!(registry.effect_of("list_files"), Some(ToolEffect::ReadOnly));
        assert_eq!(registry.effect_of("read_file"), Some(ToolEffect::ReadOnly));
        assert_eq!(
            registry.effect_of("write_files"),
            Some(ToolEffect::WritesFiles)
        );
        assert_eq!(
            registry.effect_of("run_command"),
            Some(ToolEffect::RunsCommand)
        );
    }
}
