//! Structured reports the model is asked to emit, and their parsing.
//!
//! A report is the model's *claim* about the run. The only field ever read
//! from a code-agent report is `summary`; executed commands and written
//! files always come from the recorder's verified ledger.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::{AgentError, Result};

/// Final report of a code-agent run.
#[derive(Debug, Deserialize)]
pub struct CodeAgentReport {
    pub summary: String,
}

/// Report of a single-shot query.
#[derive(Debug, Deserialize)]
pub struct QueryReport {
    pub response: String,
}

/// Models often wrap JSON in a fenced block despite instructions not to.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.trim_start_matches('\n').trim_end_matches('`').trim()
}

/// Strict parse of a structured report. Used where a malformed report must
/// fail the request (the query path).
pub fn parse_report<T: DeserializeOwned>(text: &str) -> Result<T> {
    let body = strip_code_fences(text);
    serde_json::from_str(body).map_err(|e| AgentError::ModelOutput(format!("{e}: {body}")))
}

/// Lenient summary extraction for the agent path. `None` means the caller
/// falls back to the fixed summary; the run itself is unaffected.
pub fn parse_summary(text: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }
    parse_report::<CodeAgentReport>(text)
        .ok()
        .map(|report| report.summary)
        .filter(|s| !s.trim().is_empty())
}
