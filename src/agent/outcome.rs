//! Structured tool outcomes and the success-classification policy.

/// Whether an adapter could determine the fate of an invocation itself.
///
/// `Unknown` is legitimate: a command that ran to completion may still have
/// failed semantically, and only its output text can tell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    Failure,
    Unknown,
}

/// Outcome of one tool invocation. The text is what the model sees; the
/// status is what the recorder trusts first.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub status: OutcomeStatus,
    pub text: String,
}

impl ToolOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            text: text.into(),
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failure,
            text: text.into(),
        }
    }

    pub fn unknown(text: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Unknown,
            text: text.into(),
        }
    }
}

/// Substrings that mark a textual result as failed when no structured
/// status is available. Case-sensitive, matching the collaborator's wording.
const FAILURE_MARKERS: [&str; 2] = ["failed to", "error"];

/// Decide whether an invocation succeeded.
///
/// Explicit status wins. For `Unknown`, absence of a failure marker in the
/// text counts as success. The heuristic misclassifies file content or
/// command output that happens to contain "error", so adapters should
/// report an explicit status whenever they can.
pub fn is_success(output: &ToolOutput) -> bool {
    match output.status {
        OutcomeStatus::Success => true,
        OutcomeStatus::Failure => false,
        OutcomeStatus::Unknown => !FAILURE_MARKERS
            .iter()
            .any(|marker| output.text.contains(marker)),
    }
}
