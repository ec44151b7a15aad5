// Remote execution sandbox collaborator.
pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::error::Result;

pub use client::HttpSandboxClient;

/// Identifier and reachable URL of a live sandbox session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxHandle {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::File => write!(f, "file"),
            EntryKind::Dir => write!(f, "dir"),
        }
    }
}

/// One directory entry as reported by the sandbox runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub path: String,
}

/// One file to write: path and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteEntry {
    pub path: String,
    pub data: String,
}

/// Per-file write confirmation, in the order the runtime accepted it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteConfirmation {
    pub path: String,
}

/// Captured output of a command run inside the sandbox.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// File and command primitives of the remote sandbox runtime.
///
/// Implementations must surface an expired or unknown identifier as an
/// `AgentError::Sandbox`, never as a silent no-op.
#[async_trait]
pub trait SandboxApi: Send + Sync {
    /// Create a fresh sandbox from a template.
    async fn create(&self, template: &str) -> Result<SandboxHandle>;

    /// List the entries under `path`.
    async fn list_files(&self, sandbox_id: &str, path: &str) -> Result<Vec<DirEntry>>;

    /// Read one file as text.
    async fn read_file(&self, sandbox_id: &str, path: &str) -> Result<String>;

    /// Write the given files, returning one confirmation per accepted file.
    async fn write_files(
        &self,
        sandbox_id: &str,
        entries: &[WriteEntry],
    ) -> Result<Vec<WriteConfirmation>>;

    /// Run a shell command and capture its output.
    async fn run_command(&self, sandbox_id: &str, command: &str) -> Result<CommandOutput>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::agent::error::AgentError;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// In-memory sandbox for tests: files live in a map, command outputs are
    /// scripted, and every remote call is journaled for assertions.
    #[derive(Default)]
    pub struct MockSandbox {
        pub files: Mutex<HashMap<String, String>>,
        pub command_outputs: Mutex<VecDeque<CommandOutput>>,
        pub calls: Mutex<Vec<String>>,
        pub fail_writes: bool,
    }

    impl MockSandbox {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_command_outputs(outputs: Vec<CommandOutput>) -> Self {
            Self {
                command_outputs: Mutex::new(outputs.into()),
                ..Self::default()
            }
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SandboxApi for MockSandbox {
        async fn create(&self, template: &str) -> Result<SandboxHandle> {
            self.record(format!("create {template}"));
            Ok(SandboxHandle {
                id: "sbx-test".into(),
                url: "https://sbx-test.example.dev".into(),
            })
        }

        async fn list_files(&self, _sandbox_id: &str, path: &str) -> Result<Vec<DirEntry>> {
            self.record(format!("list {path}"));
            let files = self.files.lock().unwrap();
            Ok(files
                .keys()
                .filter(|p| p.starts_with(path))
                .map(|p| DirEntry {
                    name: p.rsplit('/').next().unwrap_or(p).to_string(),
                    kind: EntryKind::File,
                    path: p.clone(),
                })
                .collect())
        }

        async fn read_file(&self, _sandbox_id: &str, path: &str) -> Result<String> {
            self.record(format!("read {path}"));
            self.files
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| AgentError::Sandbox(format!("no such file: {path}")))
        }

        async fn write_files(
            &self,
            _sandbox_id: &str,
            entries: &[WriteEntry],
        ) -> Result<Vec<WriteConfirmation>> {
            self.record(format!("write {} entries", entries.len()));
            if self.fail_writes {
                return Err(AgentError::Sandbox("sandbox session expired".into()));
            }
            let mut files = self.files.lock().unwrap();
            Ok(entries
                .iter()
                .map(|e| {
                    files.insert(e.path.clone(), e.data.clone());
                    WriteConfirmation {
                        path: e.path.clone(),
                    }
                })
                .collect())
        }

        async fn run_command(&self, _sandbox_id: &str, command: &str) -> Result<CommandOutput> {
            self.record(format!("run {command}"));
            Ok(self
                .command_outputs
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_default())
        }
    }
}
