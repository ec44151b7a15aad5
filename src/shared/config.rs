use anyhow::{anyhow, Result};
use url::Url;

/// Per-provider connection settings.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub model: String,
}

/// Service configuration, loaded from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub sandbox_api_url: String,
    pub sandbox_api_key: String,
    pub sandbox_template_id: String,
    pub openai: Option<ProviderSettings>,
    pub anthropic: Option<ProviderSettings>,
    pub google: Option<ProviderSettings>,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn provider(key_var: &str, model_var: &str, default_model: &str) -> Option<ProviderSettings> {
    env_var(key_var).map(|api_key| ProviderSettings {
        api_key,
        model: env_var(model_var).unwrap_or_else(|| default_model.to_string()),
    })
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let host = env_var("CRUCIBLE_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_var("CRUCIBLE_PORT")
            .unwrap_or_else(|| "8000".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow!("CRUCIBLE_PORT must be a port number: {e}"))?;

        let sandbox_api_url = env_var("SANDBOX_API_URL")
            .ok_or_else(|| anyhow!("SANDBOX_API_URL environment variable is required"))?;
        Url::parse(&sandbox_api_url)
            .map_err(|e| anyhow!("SANDBOX_API_URL is not a valid URL: {e}"))?;

        let sandbox_api_key = env_var("SANDBOX_API_KEY")
            .ok_or_else(|| anyhow!("SANDBOX_API_KEY environment variable is required"))?;
        let sandbox_template_id =
            env_var("SANDBOX_TEMPLATE_ID").unwrap_or_else(|| "nextjs-dev".to_string());

        Ok(Self {
            host,
            port,
            sandbox_api_url: sandbox_api_url.trim_end_matches('/').to_string(),
            sandbox_api_key,
            sandbox_template_id,
            openai: provider("OPENAI_API_KEY", "OPENAI_MODEL", "gpt-4o"),
            anthropic: provider(
                "ANTHROPIC_API_KEY",
                "ANTHROPIC_MODEL",
                "claude-3-5-sonnet-20241022",
            ),
            google: provider("GOOGLE_API_KEY", "GOOGLE_MODEL", "gemini-1.5-pro"),
        })
    }
}
