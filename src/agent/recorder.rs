//! Capture of verified sandbox side effects during an agent run.
//!
//! The model's own report of what it did is unreliable: it can claim a step
//! that never ran, drop one that did, or phrase the same action differently
//! every time. The recorder therefore watches the tool loop itself and keeps
//! a ledger built only from invocations whose outcome was judged successful.
//! That ledger, not the model's narrative, is what the caller gets back.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::sandbox::WriteEntry;

use super::outcome::{is_success, ToolOutput};
use super::tool_registry::ToolEffect;

/// Observer over the model tool-call loop. Start always precedes its
/// matching end; calls never overlap within one run.
pub trait RunObserver {
    fn on_invocation_start(&mut self, tool: &str, effect: ToolEffect, args: &serde_json::Value);
    fn on_invocation_end(&mut self, tool: &str, output: &ToolOutput);
}

/// Cumulative verified state of one agent run.
///
/// Append-only: entries land here only after a confirmed-successful
/// invocation, and there is no way to reset it short of a new run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerifiedRunState {
    /// Latest successfully written content per path. Last write wins.
    pub files: HashMap<String, String>,
    /// Successfully executed commands, in execution order. Duplicates allowed.
    pub commands: Vec<String>,
}

/// Argument contract of a file-writing invocation, as staged by the recorder.
#[derive(Debug, Deserialize)]
struct WritePayload {
    write_data: Vec<WriteEntry>,
}

/// Argument contract of a command invocation.
#[derive(Debug, Deserialize)]
struct CommandPayload {
    command: String,
}

/// One recorder per agent run. Owned by the run's coordinator, dropped with
/// it; never shared across requests.
#[derive(Debug, Default)]
pub struct RunRecorder {
    pending_files: Vec<WriteEntry>,
    pending_command: Option<String>,
    state: VerifiedRunState,
}

impl RunRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop whatever is staged. Called on every invocation boundary and by
    /// the coordinator on any early exit from the loop, so a later success
    /// can never absorb an unrelated earlier attempt.
    pub fn discard_pending(&mut self) {
        self.pending_files.clear();
        self.pending_command = None;
    }

    /// Consume the recorder, yielding the verified ledger.
    pub fn finish(self) -> VerifiedRunState {
        self.state
    }

    #[cfg(test)]
    pub fn state(&self) -> &VerifiedRunState {
        &self.state
    }

    fn stage(&mut self, tool: &str, effect: ToolEffect, args: &serde_json::Value) {
        match effect {
            ToolEffect::ReadOnly => {}
            ToolEffect::WritesFiles => {
                match serde_json::from_value::<WritePayload>(args.clone()) {
                    Ok(payload) => {
                        debug!(tool, staged = payload.write_data.len(), "staged file writes");
                        self.pending_files = payload.write_data;
                    }
                    Err(e) => {
                        // The tool itself will reject the malformed payload;
                        // nothing verifiable to stage here.
                        warn!(tool, error = %e, "write payload failed its contract; not staged");
                    }
                }
            }
            ToolEffect::RunsCommand => match serde_json::from_value::<CommandPayload>(args.clone())
            {
                Ok(payload) if !payload.command.is_empty() => {
                    debug!(tool, command = %payload.command, "staged command");
                    self.pending_command = Some(payload.command);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(tool, error = %e, "command payload failed its contract; not staged");
                }
            },
        }
    }

    fn commit(&mut self) {
        for entry in self.pending_files.drain(..) {
            self.state.files.insert(entry.path, entry.data);
        }
        if let Some(command) = self.pending_command.take() {
            self.state.commands.push(command);
        }
    }
}

impl RunObserver for RunRecorder {
    fn on_invocation_start(&mut self, tool: &str, effect: ToolEffect, args: &serde_json::Value) {
        // An invocation that never reached its end must not leak staged
        // effects into this one.
        self.discard_pending();
        self.stage(tool, effect, args);
    }

    fn on_invocation_end(&mut self, tool: &str, output: &ToolOutput) {
        if is_success(output) {
            self.commit();
        } else {
            debug!(tool, "invocation failed; staged effects discarded");
        }
        self.discard_pending();
    }
}
