//! Single-shot query path: no tools, no recorder, strict parsing.

use std::sync::Arc;

use tracing::info;

use super::error::Result;
use super::guardrails::Guardrails;
use super::prompts::QUERY_PROMPT;
use super::providers::{ModelClient, TranscriptItem};
use super::report::{parse_report, QueryReport};

pub struct QueryCoordinator {
    model: Arc<dyn ModelClient>,
    guardrails: Guardrails,
}

impl QueryCoordinator {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            guardrails: Guardrails::new(),
        }
    }

    /// Submit one query and return the extracted answer. A response that
    /// does not match the declared shape fails the whole request; there is
    /// no partial result on this path.
    pub async fn run(&self, message: &str) -> Result<String> {
        self.guardrails.validate_input(message)?;

        let transcript = vec![TranscriptItem::User(message.to_string())];
        let turn = self.model.chat(QUERY_PROMPT, &transcript, &[]).await?;

        let report: QueryReport = parse_report(&turn.content)?;
        info!(
            model = self.model.name(),
            response_length = report.response.len(),
            "query completed"
        );
        Ok(report.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::error::AgentError;
    use crate::agent::providers::mock::ScriptedModel;
    use crate::agent::providers::ModelTurn;

    #[tokio::test]
    async fn extracts_the_response_field() {
        let model = Arc::new(ScriptedModel::new(vec![ModelTurn {
            content: r#"{"response": "Rust compiles to native code."}"#.into(),
            tool_calls: vec![],
        }]));

        let answer = QueryCoordinator::new(model)
            .run("what does rust compile to?")
            .await
            .unwrap();
        assert_eq!(answer, "Rust compiles to native code.");
    }

    #[tokio::test]
    async fn unparseable_response_fails_the_request() {
        let model = Arc::new(ScriptedModel::new(vec![ModelTurn {
            content: "It compiles to native code.".into(),
            tool_calls: vec![],
        }]));

        let err = QueryCoordinator::new(model)
            .run("what does rust compile to?")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ModelOutput(_)));
    }
}
