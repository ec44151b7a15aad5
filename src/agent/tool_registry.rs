use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::outcome::ToolOutput;

/// What a tool does to the sandbox when it succeeds. The recorder stages
/// pending effects based on this flag, never on argument-name sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolEffect {
    ReadOnly,
    WritesFiles,
    RunsCommand,
}

/// Core trait every sandbox tool implements.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to the model.
    fn name(&self) -> &str;

    /// Tool description as exposed to the model.
    fn description(&self) -> &str;

    /// JSON schema of the tool's arguments.
    fn parameters(&self) -> serde_json::Value;

    /// Declared capability, consumed by the invocation recorder.
    fn effect(&self) -> ToolEffect {
        ToolEffect::ReadOnly
    }

    /// Execute the tool with the given arguments.
    async fn execute(&self, args: &serde_json::Value) -> crate::agent::error::Result<ToolOutput>;
}

/// Provider-neutral tool definition handed to the model collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDef {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Registry of the tools available to one agent run.
///
/// Built once per run and only read afterwards; the driving loop is
/// sequential, so no interior locking is needed.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        info!(tool = tool.name(), "registering tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Declared effect of a tool, if registered.
    pub fn effect_of(&self, name: &str) -> Option<ToolEffect> {
        self.tools.get(name).map(|t| t.effect())
    }

    /// Definitions for every registered tool, sorted by name for a stable
    /// prompt layout.
    pub fn definitions(&self) -> Vec<ToolDef> {
        let mut defs: Vec<ToolDef> = self
            .tools
            .values()
            .map(|tool| ToolDef {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Execute a tool and fold every failure mode into a `ToolOutput`.
    ///
    /// Unknown tools and adapter errors become failure text rather than run
    /// aborts: the model sees its own mistake and may react to it.
    pub async fn execute(&self, name: &str, args: &serde_json::Value) -> ToolOutput {
        let Some(tool) = self.tools.get(name) else {
            return ToolOutput::failure(format!("failed to run tool '{name}': unknown tool"));
        };
        match tool.execute(args).await {
            Ok(output) => output,
            Err(e) => ToolOutput::failure(format!("failed to run tool '{name}': {e}")),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
