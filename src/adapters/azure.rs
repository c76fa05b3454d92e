//! Azure OpenAI inference provider.
//!
//! Calls a chat-completions deployment over REST. Configured entirely
//! from environment variables:
//!
//! - `AZURE_OPENAI_ENDPOINT`      e.g. https://<resource>.openai.azure.com/
//! - `AZURE_OPENAI_API_KEY`       API key
//! - `AZURE_OPENAI_API_VERSION`   optional, defaults below
//! - `AZURE_OPENAI_DEPLOYMENT`    deployment name, e.g. 'o3'

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use super::InferenceProvider;

const DEFAULT_API_VERSION: &str = "2024-12-01-preview";
const DEFAULT_DEPLOYMENT: &str = "o3";
const MAX_COMPLETION_TOKENS: u32 = 2000;

/// Azure OpenAI chat-completions client
pub struct AzureOpenAiProvider {
    endpoint: String,
    api_key: String,
    api_version: String,
    deployment: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl AzureOpenAiProvider {
    pub fn new(endpoint: String, api_key: String, api_version: String, deployment: String) -> Self {
        Self {
            endpoint,
            api_key,
            api_version,
            deployment,
            client: reqwest::Client::new(),
        }
    }

    /// Build from `AZURE_OPENAI_*` env; `None` when endpoint or key is
    /// missing.
    pub fn from_env() -> Option<Self> {
        let endpoint = std::env::var("AZURE_OPENAI_ENDPOINT").ok()?;
        let api_key = std::env::var("AZURE_OPENAI_API_KEY").ok()?;
        let api_version = std::env::var("AZURE_OPENAI_API_VERSION")
            .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string());
        let deployment = std::env::var("AZURE_OPENAI_DEPLOYMENT")
            .unwrap_or_else(|_| DEFAULT_DEPLOYMENT.to_string());
        Some(Self::new(endpoint, api_key, api_version, deployment))
    }

    fn api_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

#[async_trait]
impl InferenceProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure-openai"
    }

    async fn infer(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(self.api_url())
            .header("api-key", &self.api_key)
            .json(&serde_json::json!({
                "messages": [{"role": "user", "content": prompt}],
                "max_completion_tokens": MAX_COMPLETION_TOKENS,
            }))
            .send()
            .await
            .context("Failed to reach Azure OpenAI")?
            .error_for_status()
            .context("Azure OpenAI returned an error status")?;

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Azure OpenAI response")?;

        let text = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(text)
    }
}
