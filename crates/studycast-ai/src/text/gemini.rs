//! Google Gemini `generateContent` client with model fallback.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{DocumentAnalyzer, SourceDocument, TextGenerator};
use crate::env;
use crate::error::{AiError, AiResult};
use crate::http::{build_client, check_status, send_error};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Configuration for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Models tried in order until one answers
    pub models: Vec<String>,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("GEMINI_API_KEY"),
            base_url: env::var_or("GEMINI_BASE_URL", DEFAULT_BASE_URL),
            models: env::list_or("GEMINI_MODELS", DEFAULT_MODELS),
            timeout: env::secs_or("TEXT_GEN_TIMEOUT_SECS", 120),
        }
    }

    /// Same provider settings for document analysis, which uploads whole
    /// files and gets a longer request timeout.
    pub fn analysis_from_env() -> Self {
        Self {
            timeout: env::secs_or("ANALYSIS_TIMEOUT_SECS", 300),
            ..Self::from_env()
        }
    }
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    client: Client,
    config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: &'a [Part],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    /// Base64 of the file contents
    data: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> AiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| AiError::config("GEMINI_API_KEY not set"))?;
        if config.models.is_empty() {
            return Err(AiError::config("no Gemini models configured"));
        }

        Ok(Self {
            api_key,
            client: build_client(config.timeout)?,
            config,
        })
    }

    async fn call_model(&self, model: &str, parts: &[Part]) -> AiResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&GeminiRequest {
                contents: vec![Content { parts }],
            })
            .send()
            .await
            .map_err(|e| send_error("Gemini", e, self.config.timeout))?;
        let response = check_status("Gemini", response).await?;

        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AiError::invalid_response(format!("Failed to parse Gemini response: {}", e)))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::invalid_response("No content in Gemini response"));
        }
        Ok(text)
    }

    /// Try each configured model in order until one answers.
    async fn call_with_fallback(&self, parts: &[Part]) -> AiResult<String> {
        let mut last_error = None;

        for model in &self.config.models {
            debug!("Attempting Gemini API with model: {}", model);
            match self.call_model(model, parts).await {
                Ok(text) => {
                    info!(model = %model, chars = text.len(), "Gemini generation succeeded");
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AiError::unavailable("All Gemini models failed")))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> AiResult<String> {
        self.call_with_fallback(&[Part::Text(prompt.to_string())]).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl DocumentAnalyzer for GeminiClient {
    /// One `generateContent` call carrying the prompt followed by every
    /// document as an inline part.
    async fn analyze_documents(&self, prompt: &str, documents: &[SourceDocument]) -> AiResult<String> {
        if documents.is_empty() {
            return Err(AiError::request_failed("no documents to analyze"));
        }

        let mut parts = Vec::with_capacity(documents.len() + 1);
        parts.push(Part::Text(prompt.to_string()));
        for doc in documents {
            debug!(document = %doc.name, mime_type = doc.mime_type, bytes = doc.bytes.len(), "Attaching document");
            parts.push(Part::InlineData(InlineData {
                mime_type: doc.mime_type.to_string(),
                data: STANDARD.encode(&doc.bytes),
            }));
        }

        self.call_with_fallback(&parts).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
