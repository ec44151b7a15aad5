use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::agent::error::{AgentError, Result};
use crate::agent::tool_registry::ToolDef;

use super::{ModelClient, ModelTurn, ToolCall, TranscriptItem};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini generateContent adapter.
///
/// Gemini function calls carry no call id; one is minted locally so the
/// neutral transcript stays uniform across providers.
pub struct GoogleClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "functionCall", default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

impl GoogleClient {
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

    fn build_contents(transcript: &[TranscriptItem]) -> Vec<serde_json::Value> {
        let mut contents = Vec::new();
        for item in transcript {
            match item {
                TranscriptItem::User(text) => {
                    contents.push(json!({"role": "user", "parts": [{"text": text}]}));
                }
                TranscriptItem::Assistant {
                    content,
                    tool_calls,
                } => {
                    let mut parts = Vec::new();
                    if !content.is_empty() {
                        parts.push(json!({"text": content}));
                    }
                    for tc in tool_calls {
                        parts.push(json!({
                            "functionCall": {"name": tc.name, "args": tc.arguments}
                        }));
                    }
                    contents.push(json!({"role": "model", "parts": parts}));
                }
                TranscriptItem::ToolResult {
                    tool_name, content, ..
                } => {
                    contents.push(json!({
                        "role": "user",
                        "parts": [{
                            "functionResponse": {
                                "name": tool_name,
                                "response": {"content": content},
                            }
                        }],
                    }));
                }
            }
        }
        contents
    }

    fn decode_turn(resp: GenerateResponse) -> Result<ModelTurn> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Model("Gemini returned no candidates".into()))?;

        let mut turn = ModelTurn::default();
        for part in candidate.content.parts {
            if let Some(text) = part.text {
                if !turn.content.is_empty() {
                    turn.content.push('\n');
                }
                turn.content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                turn.tool_calls.push(ToolCall {
                    id: format!("{}-{}", call.name, Uuid::new_v4()),
                    name: call.name,
                    arguments: call.args,
                });
            }
        }
        Ok(turn)
    }
}

#[async_trait]
impl ModelClient for GoogleClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn chat(
        &self,
        system_prompt: &str,
        transcript: &[TranscriptItem],
        tools: &[ToolDef],
    ) -> Result<ModelTurn> {
        let mut body = json!({
            "systemInstruction": {"parts": [{"text": system_prompt}]},
            "contents": Self::build_contents(transcript),
        });
        if !tools.is_empty() {
            body["tools"] = json!([{
                "functionDeclarations": tools
                    .iter()
                    .map(|t| json!({
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters,
                    }))
                    .collect::<Vec<_>>()
            }]);
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Model(format!("Gemini request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_else(|_| "<no body>".into());
            return Err(AgentError::Model(format!(
                "Gemini responded {status}: {text}"
            )));
        }

        let decoded: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| AgentError::Model(format!("invalid JSON from Gemini: {e}")))?;
        Self::decode_turn(decoded)
    }
}
