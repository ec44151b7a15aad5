//! Model provider adapters.
//!
//! One capability interface (a chat turn over a neutral transcript, with an
//! optional tool set) implemented by three thin HTTP adapters. Everything
//! above this module (coordinator, recorder) is written once against the
//! trait and does not know which provider is behind it.

pub mod anthropic;
pub mod google;
pub mod openai;

use async_trait::async_trait;

use super::error::Result;
use super::tool_registry::ToolDef;

pub use anthropic::AnthropicClient;
pub use google::GoogleClient;
pub use openai::OpenAiClient;

/// One tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One item of the provider-neutral conversation transcript.
#[derive(Debug, Clone)]
pub enum TranscriptItem {
    User(String),
    Assistant {
        content: String,
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        call_id: String,
        tool_name: String,
        content: String,
    },
}

/// The model's decision for one turn: tool calls to run, or a final answer.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelTurn {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Chat-with-optional-tool-calling capability of one provider.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Provider name as used in API routes and logs.
    fn name(&self) -> &str;

    /// One chat turn: the full transcript in, the model's decision out.
    async fn chat(
        &self,
        system_prompt: &str,
        transcript: &[TranscriptItem],
        tools: &[ToolDef],
    ) -> Result<ModelTurn>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::agent::error::AgentError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Plays back a fixed sequence of model turns.
    pub struct ScriptedModel {
        turns: Mutex<VecDeque<ModelTurn>>,
    }

    impl ScriptedModel {
        pub fn new(turns: Vec<ModelTurn>) -> Self {
            Self {
                turns: Mutex::new(turns.into()),
            }
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn chat(
            &self,
            _system_prompt: &str,
            _transcript: &[TranscriptItem],
            _tools: &[ToolDef],
        ) -> Result<ModelTurn> {
            self.turns
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::Model("script exhausted".into()))
        }
    }

    /// Fails every chat call, for abort-path tests.
    pub struct FailingModel;

    #[async_trait]
    impl ModelClient for FailingModel {
        fn name(&self) -> &str {
            "failing"
        }

        async fn chat(
            &self,
            _system_prompt: &str,
            _transcript: &[TranscriptItem],
            _tools: &[ToolDef],
        ) -> Result<ModelTurn> {
            Err(AgentError::Model("provider unavailable".into()))
        }
    }
}
