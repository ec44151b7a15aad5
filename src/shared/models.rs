use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::agent::providers::{AnthropicClient, GoogleClient, ModelClient, OpenAiClient};
use crate::sandbox::{HttpSandboxClient, SandboxApi};

use super::config::Settings;

/// Application state shared across requests. Everything here is immutable
/// after startup; per-request mutable state lives inside each agent run.
pub struct AppState {
    pub settings: Settings,
    pub sandbox: Arc<dyn SandboxApi>,
    models: HashMap<String, Arc<dyn ModelClient>>,
}

impl AppState {
    pub fn build(settings: Settings) -> Result<Self> {
        let sandbox: Arc<dyn SandboxApi> = Arc::new(HttpSandboxClient::new(
            &settings.sandbox_api_url,
            &settings.sandbox_api_key,
        )?);

        let mut models: HashMap<String, Arc<dyn ModelClient>> = HashMap::new();
        if let Some(p) = &settings.openai {
            let client: Arc<dyn ModelClient> = Arc::new(OpenAiClient::new(&p.api_key, &p.model)?);
            models.insert(client.name().to_string(), client);
        }
        if let Some(p) = &settings.anthropic {
            let client: Arc<dyn ModelClient> =
                Arc::new(AnthropicClient::new(&p.api_key, &p.model)?);
            models.insert(client.name().to_string(), client);
        }
        if let Some(p) = &settings.google {
            let client: Arc<dyn ModelClient> = Arc::new(GoogleClient::new(&p.api_key, &p.model)?);
            models.insert(client.name().to_string(), client);
        }

        if models.is_empty() {
            warn!("no model provider configured; agent and query endpoints will reject requests");
        } else {
            let mut names: Vec<&str> = models.keys().map(String::as_str).collect();
            names.sort();
            info!(providers = names.join(","), "model providers configured");
        }

        Ok(Self {
            settings,
            sandbox,
            models,
        })
    }

    /// Look up a configured provider by name.
    pub fn model(&self, name: &str) -> Option<Arc<dyn ModelClient>> {
        self.models.get(name).cloned()
    }
}
