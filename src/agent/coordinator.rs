//! The per-request agent run: one bounded model-tool loop, observed by a
//! fresh recorder, reconciled into a single result.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::sandbox::SandboxApi;

use super::error::Result;
use super::guardrails::Guardrails;
use super::prompts::CODE_AGENT_PROMPT;
use super::providers::{ModelClient, TranscriptItem};
use super::recorder::{RunObserver, RunRecorder};
use super::report::parse_summary;
use super::sandbox_tools::build_toolset;
use super::tool_registry::ToolEffect;

/// Fixed summary used when the model's final output is empty or does not
/// parse. The verified ledger is authoritative either way.
pub const FALLBACK_SUMMARY: &str = "Task completed successfully";

/// Upper bound on model turns per run. A run that exhausts it degrades to
/// the fallback summary over whatever the ledger holds.
const MAX_AGENT_TURNS: usize = 16;

/// Reconciled output of one agent run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRunResult {
    pub summary: String,
    pub commands: Vec<String>,
    pub files: HashMap<String, String>,
}

/// Drives one code-agent run per call. Stateless across runs: every run gets
/// its own toolset and recorder.
pub struct CodeAgentCoordinator {
    model: Arc<dyn ModelClient>,
    sandbox: Arc<dyn SandboxApi>,
    guardrails: Guardrails,
}

impl CodeAgentCoordinator {
    pub fn new(model: Arc<dyn ModelClient>, sandbox: Arc<dyn SandboxApi>) -> Self {
        Self {
            model,
            sandbox,
            guardrails: Guardrails::new(),
        }
    }

    /// Run the task against the given sandbox until the model reports
    /// completion, then reconcile its claimed summary with the verified
    /// ledger of side effects.
    pub async fn run(&self, sandbox_id: &str, task: &str) -> Result<AgentRunResult> {
        self.guardrails.validate_input(task)?;

        let registry = build_toolset(self.sandbox.clone(), sandbox_id);
        let tool_defs = registry.definitions();
        let mut recorder = RunRecorder::new();

        let mut transcript = vec![TranscriptItem::User(format!(
            "Sandbox ID: {sandbox_id}\nTask: {task}"
        ))];

        let mut final_text = String::new();
        for turn_index in 0..MAX_AGENT_TURNS {
            let turn = match self
                .model
                .chat(CODE_AGENT_PROMPT, &transcript, &tool_defs)
                .await
            {
                Ok(turn) => turn,
                Err(e) => {
                    // Pending effects never outlive an aborted run.
                    recorder.discard_pending();
                    return Err(e);
                }
            };

            if !turn.has_tool_calls() {
                final_text = turn.content;
                break;
            }

            transcript.push(TranscriptItem::Assistant {
                content: turn.content.clone(),
                tool_calls: turn.tool_calls.clone(),
            });

            // Tool calls run strictly one at a time; each is bracketed by
            // the observer so only confirmed outcomes reach the ledger.
            for call in &turn.tool_calls {
                let effect = registry
                    .effect_of(&call.name)
                    .unwrap_or(ToolEffect::ReadOnly);
                recorder.on_invocation_start(&call.name, effect, &call.arguments);
                let output = registry.execute(&call.name, &call.arguments).await;
                recorder.on_invocation_end(&call.name, &output);

                info!(
                    turn = turn_index,
                    tool = %call.name,
                    outcome = ?output.status,
                    "tool invocation finished"
                );
                transcript.push(TranscriptItem::ToolResult {
                    call_id: call.id.clone(),
                    tool_name: call.name.clone(),
                    content: output.text,
                });
            }
        }

        let summary = match parse_summary(&final_text) {
            Some(summary) => summary,
            None => {
                warn!(
                    model = self.model.name(),
                    "model final output empty or unparseable; using fallback summary"
                );
                FALLBACK_SUMMARY.to_string()
            }
        };

        let state = recorder.finish();
        info!(
            model = self.model.name(),
            commands = state.commands.len(),
            files = state.files.len(),
            "agent run reconciled"
        );
        Ok(AgentRunResult {
            summary,
            commands: state.commands,
            files: state.files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::error::AgentError;
    use crate::agent::providers::mock::{FailingModel, ScriptedModel};
    use crate::agent::providers::{ModelTurn, ToolCall};
    use crate::sandbox::mock::MockSandbox;
    use crate::sandbox::CommandOutput;
    use serde_json::json;

    fn tool_turn(name: &str, arguments: serde_json::Value) -> ModelTurn {
        ModelTurn {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: format!("call-{name}"),
                name: name.into(),
                arguments,
            }],
        }
    }

    fn final_turn(content: &str) -> ModelTurn {
        ModelTurn {
            content: content.into(),
            tool_calls: vec![],
        }
    }

    #[tokio::test]
    async fn successful_write_is_reconciled_with_summary() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_turn(
                "write_files",
                json!({"write_data": [{"path": "app/page.tsx", "data": "export default Page"}]}),
            ),
            final_turn(r#"{"summary": "Updated homepage"}"#),
        ]));
        let sandbox = Arc::new(MockSandbox::new());

        let result = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "update the homepage")
            .await
            .unwrap();

        assert_eq!(result.summary, "Updated homepage");
        assert!(result.commands.is_empty());
        assert_eq!(
            result.files.get("app/page.tsx").map(String::as_str),
            Some("export default Page")
        );
    }

    #[tokio::test]
    async fn failed_command_retry_records_only_the_success() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_turn("run_command", json!({"command": "npm install foo"})),
            tool_turn("run_command", json!({"command": "npm install foo"})),
            final_turn(r#"{"summary": "Installed foo"}"#),
        ]));
        let sandbox = Arc::new(MockSandbox::with_command_outputs(vec![
            CommandOutput {
                stdout: String::new(),
                stderr: "error: network timeout".into(),
            },
            CommandOutput {
                stdout: "added 1 package".into(),
                stderr: String::new(),
            },
        ]));

        let result = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "install foo")
            .await
            .unwrap();

        assert_eq!(result.commands, vec!["npm install foo"]);
    }

    #[tokio::test]
    async fn empty_final_output_degrades_to_fallback_summary() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_turn(
                "write_files",
                json!({"write_data": [{"path": "a.txt", "data": "x"}]}),
            ),
            final_turn(""),
        ]));
        let sandbox = Arc::new(MockSandbox::new());

        let result = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "write a file")
            .await
            .unwrap();

        assert_eq!(result.summary, FALLBACK_SUMMARY);
        assert_eq!(result.files.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_final_output_degrades_to_fallback_summary() {
        let model = Arc::new(ScriptedModel::new(vec![final_turn(
            "All done! I updated everything you asked for.",
        )]));
        let sandbox = Arc::new(MockSandbox::new());

        let result = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "do a thing")
            .await
            .unwrap();

        assert_eq!(result.summary, FALLBACK_SUMMARY);
    }

    #[tokio::test]
    async fn provider_failure_aborts_the_run() {
        let sandbox = Arc::new(MockSandbox::new());
        let err = CodeAgentCoordinator::new(Arc::new(FailingModel), sandbox)
            .run("sbx-1", "do a thing")
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Model(_)));
    }

    #[tokio::test]
    async fn forbidden_listing_fails_the_call_but_not_the_run() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_turn("list_files", json!({"path": "/etc"})),
            final_turn(r#"{"summary": "Could not inspect /etc"}"#),
        ]));
        let sandbox = Arc::new(MockSandbox::new());

        let result = CodeAgentCoordinator::new(model, sandbox.clone())
            .run("sbx-1", "look around")
            .await
            .unwrap();

        // The forbidden call never reached the sandbox and left no trace
        // in the ledger.
        assert_eq!(sandbox.call_count(), 0);
        assert!(result.commands.is_empty());
        assert!(result.files.is_empty());
        assert_eq!(result.summary, "Could not inspect /etc");
    }

    #[tokio::test]
    async fn failed_write_never_reaches_the_ledger() {
        let model = Arc::new(ScriptedModel::new(vec![
            tool_turn(
                "write_files",
                json!({"write_data": [{"path": "a.txt", "data": "x"}]}),
            ),
            final_turn(r#"{"summary": "Tried to write"}"#),
        ]));
        let sandbox = Arc::new(MockSandbox {
            fail_writes: true,
            ..MockSandbox::new()
        });

        let result = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "write a file")
            .await
            .unwrap();

        assert!(result.files.is_empty());
    }

    #[tokio::test]
    async fn guardrail_violation_rejects_the_task() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let sandbox = Arc::new(MockSandbox::new());

        let err = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Guardrail(_)));
    }

    #[tokio::test]
    async fn turn_limit_exhaustion_degrades_instead_of_failing() {
        let turns: Vec<ModelTurn> = (0..MAX_AGENT_TURNS)
            .map(|_| tool_turn("run_command", json!({"command": "npm test"})))
            .collect();
        let model = Arc::new(ScriptedModel::new(turns));
        let outputs = (0..MAX_AGENT_TURNS)
            .map(|_| CommandOutput {
                stdout: "1 passed".into(),
                stderr: String::new(),
            })
            .collect();
        let sandbox = Arc::new(MockSandbox::with_command_outputs(outputs));

        let result = CodeAgentCoordinator::new(model, sandbox)
            .run("sbx-1", "run the tests forever")
            .await
            .unwrap();

        assert_eq!(result.summary, FALLBACK_SUMMARY);
        assert_eq!(result.commands.len(), MAX_AGENT_TURNS);
    }
}
