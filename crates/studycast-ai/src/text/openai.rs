//! OpenAI Responses API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::TextGenerator;
use crate::env;
use crate::error::{AiError, AiResult};
use crate::http::{build_client, check_status, send_error};

pub(crate) const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Clone)]
pub struct OpenAiTextConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAiTextConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiTextConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("OPENAI_API_KEY"),
            base_url: env::var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: env::var_or("OPENAI_TEXT_MODEL", &defaults.model),
            timeout: env::secs_or("TEXT_GEN_TIMEOUT_SECS", 120),
        }
    }
}

pub struct OpenAiTextClient {
    api_key: String,
    client: Client,
    config: OpenAiTextConfig,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl ResponsesResponse {
    /// Concatenate every `output_text` block, like the SDKs' `output_text`.
    fn output_text(self) -> String {
        self.output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|c| c.kind == "output_text")
            .map(|c| c.text)
            .collect()
    }
}

impl OpenAiTextClient {
    pub fn new(config: OpenAiTextConfig) -> AiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AiError::config("OPENAI_API_KEY not set"))?;
        Ok(Self {
            api_key,
            client: build_client(config.timeout)?,
            config,
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiTextClient {
    async fn generate(&self, prompt: &str) -> AiResult<String> {
        let url = format!("{}/v1/responses", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ResponsesRequest {
                model: &self.config.model,
                input: prompt,
            })
            .send()
            .await
            .map_err(|e| send_error("OpenAI", e, self.config.timeout))?;
        let response = check_status("OpenAI", response).await?;

        let body: ResponsesResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = body.output_text();
        if text.trim().is_empty() {
            return Err(AiError::invalid_response("No output_text in OpenAI response"));
        }

        info!(model = %self.config.model, chars = text.len(), "OpenAI generation succeeded");
        Ok(text)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
