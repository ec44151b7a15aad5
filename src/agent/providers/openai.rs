use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::agent::error::{AgentError, Result};
use crate::agent::tool_registry::ToolDef;

use super::{ModelClient, ModelTurn, ToolCall, TranscriptItem};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions adapter.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<RawToolCall>,
}

#[derive(Debug, Deserialize)]
struct RawToolCall {
    id: String,
    function: RawFunction,
}

#[derive(Debug, Deserialize)]
struct RawFunction {
    name: String,
    arguments: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| AgentError::Model(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn build_messages(
        system_prompt: &str,
        transcript: &[TranscriptItem],
    ) -> Vec<serde_json::Value> {
        let mut messages = vec![json!({"role": "system", "content": system_prompt})];
        for item in transcript {
            match item {
                TranscriptItem::User(text) => {
                    messages.push(json!({"role": "user", "content": text}));
                }
                TranscriptItem::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut message = json!({"role": "assistant"});
                    message["content"] = if content.is_empty() {
                        serde_json::Value::Null
                    } else {
                        json!(content)
                    };
                    if !tool_calls.is_empty() {
                        message["tool_calls"] = tool_calls
                            .iter()
                            .map(|tc| {
                                json!({
                                    "id": tc.id,
                                    "type": "function",
                                    "function": {
                                        "name": tc.name,
                                        "arguments": tc.arguments.to_string(),
                                    }
                                })
                            })
                            .collect();
                    }
                    messages.push(message);
                }
                TranscriptItem::ToolResult {
                    call_id, content, ..
                } => {
                    messages.push(json!({
                        "role": "tool",
                        "tool_call_id": call_id,
                        "content": content,
                    }));
                }
            }
        }
        messages
    }

    fn decode_turn(completion: ChatCompletion) -> Result<ModelTurn> {
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Model("OpenAI returned no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                let arguments: serde_json::Value =
                    serde_json::from_str(&tc.function.arguments).map_err(|e| {
                        AgentError::Model(format!(
                            "OpenAI tool call '{}' carried invalid arguments JSON: {e}",
                            tc.function.name
                        ))
                    })?;
                Ok(ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ModelTurn {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(
        &self,
        system_prompt: &str,
        transcript: &[TranscriptItem],
        tools: &[ToolDef],
    ) -> Result<ModelTurn> {
        let mut body = json!({
            "model": self.model,
            "messages": Self::build_messages(system_prompt, transcript),
        });
        if !tools.is_empty() {
            body["tools"] = tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
        }

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Model(format!("OpenAI request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AgentError::Model(format!(
                "OpenAI responded {status}: {text}"
            )));
        }

        let completion: ChatCompletion = resp
            .json()
            .await
            .map_err(|e| AgentError::Model(format!("invalid JSON from OpenAI: {e}")))?;
        Self::decode_turn(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_tool_call_turn() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {
                                "name": "run_command",
                                "arguments": "{\"command\": \"npm install foo\"}"
                            }
                        }]
                    }
                }]
            }"#,
        )
        .unwrap();

        let turn = OpenAiClient::decode_turn(completion).unwrap();
        assert!(turn.has_tool_calls());
        assert_eq!(turn.tool_calls[0].name, "run_command");
        assert_eq!(
            turn.tool_calls[0].arguments,
            serde_json::json!({"command": "npm install foo"})
        );
    }

    #[test]
    fn invalid_arguments_json_is_a_model_error() {
        let completion: ChatCompletion = serde_json::from_str(
            r#"{
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "function": {"name": "run_command", "arguments": "{broken"}
                        }]
                    }
                }]
            }"#,
        )
        .unwrap();

        assert!(matches!(
            OpenAiClient::decode_turn(completion),
            Err(AgentError::Model(_))
        ));
    }

    #[test]
    fn tool_results_map_to_tool_role() {
        let transcript = vec![
            TranscriptItem::User("task".into()),
            TranscriptItem::Assistant {
                content: String::new(),
                tool_calls: vec![ToolCall {
                    id: "call_1".into(),
                    name: "read_file".into(),
                    arguments: serde_json::json!({"path": "a.txt"}),
                }],
            },
            TranscriptItem::ToolResult {
                call_id: "call_1".into(),
                tool_name: "read_file".into(),
                content: "hello".into(),
            },
        ];

        let messages = OpenAiClient::build_messages("system", &transcript);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2]["tool_calls"][0]["id"], "call_1");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
    }
}
