use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::agent::error::{AgentError, Result};
use crate::agent::tool_registry::ToolDef;

use super::{ModelClient, ModelTurn, ToolCall, TranscriptItem};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 8192;

/// Anthropic messages-API adapter.
pub struct AnthropicClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

impl AnthropicClient {
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

    fn build_messages(transcript: &[TranscriptItem]) -> Vec<serde_json::Value> {
        let mut messages = Vec::new();
        for item in transcript {
            match item {
                TranscriptItem::User(text) => {
                    messages.push(json!({
                        "role": "user",
                        "content": [{"type": "text", "text": text}],
                    }));
                }
                TranscriptItem::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut blocks = Vec::new();
                    if !content.is_empty() {
                        blocks.push(json!({"type": "text", "text": content}));
                    }
                    for tc in tool_calls {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": tc.id,
                            "name": tc.name,
                            "input": tc.arguments,
                        }));
                    }
                    messages.push(json!({"role": "assistant", "content": blocks}));
                }
                TranscriptItem::ToolResult {
                    call_id, content, ..
                } => {
                    messages.push(json!({
                        "role": "user",
                        "content": [{
                            "type": "tool_result",
                            "tool_use_id": call_id,
                            "content": content,
                        }],
                    }));
                }
            }
        }
        messages
    }

    fn decode_turn(resp: MessagesResponse) -> ModelTurn {
        let mut turn = ModelTurn::default();
        for block in resp.content {
            match block {
                ContentBlock::Text { text } => {
                    if !turn.content.is_empty() {
                        turn.content.push('\n');
                    }
                    turn.content.push_str(&text);
                }
                ContentBlock::ToolUse { id, name, input } => {
                    turn.tool_calls.push(ToolCall {
                        id,
                        name,
                        arguments: input,
                    });
                }
                ContentBlock::Other => {}
            }
        }
        turn
    }
}

#[async_trait]
impl ModelClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(
        &self,
        system_prompt: &str,
        transcript: &[TranscriptItem],
        tools: &[ToolDef],
    ) -> Result<ModelTurn> {
        let mut body = json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "system": system_prompt,
            "messages": Self::build_messages(transcript),
        });
        if !tools.is_empty() {
            body["tools"] = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.parameters,
                    })
                })
                .collect();
        }

        let resp = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Model(format!("Anthropic request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AgentError::Model(format!(
                "Anthropic responded {status}: {text}"
            )));
        }

        let decoded: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Model(format!("invalid JSON from Anthropic: {e}")))?;
        Ok(Self::decode_turn(decoded))
    }
}
