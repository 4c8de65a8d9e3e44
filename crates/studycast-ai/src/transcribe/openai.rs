//! OpenAI transcription client (`verbose_json` with segment timestamps).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use studycast_models::TranscriptSegment;

use super::{Transcriber, WhisperJson};
use crate::env;
use crate::error::{AiError, AiResult};
use crate::http::{build_client, check_status, send_error};
use crate::text::DEFAULT_OPENAI_BASE_URL;

#[derive(Debug, Clone)]
pub struct OpenAiTranscriptionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub language: Option<String>,
    pub timeout: Duration,
}

impl Default for OpenAiTranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: "whisper-1".to_string(),
            language: Some("de".to_string()),
            timeout: Duration::from_secs(300),
        }
    }
}

impl OpenAiTranscriptionConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("OPENAI_API_KEY"),
            base_url: env::var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: env::var_or("OPENAI_TRANSCRIPTION_MODEL", "whisper-1"),
            language: Some(env::var_or("TRANSCRIPTION_LANGUAGE", "de")).filter(|l| l != "auto"),
            timeout: env::secs_or("TRANSCRIPTION_TIMEOUT_SECS", 300),
        }
    }
}

pub struct OpenAiTranscriptionClient {
    api_key: String,
    client: Client,
    config: OpenAiTranscriptionConfig,
}

impl OpenAiTranscriptionClient {
    pub fn new(config: OpenAiTranscriptionConfig) -> AiResult<Self> {
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

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl Transcriber for OpenAiTranscriptionClient {
    async fn transcribe(&self, audio: &Path) -> AiResult<Vec<TranscriptSegment>> {
        let bytes = tokio::fs::read(audio).await?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let file = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_for(audio))
            .map_err(AiError::Network)?;
        let mut form = Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "segment");
        if let Some(language) = &self.config.language {
            form = form.text("language", language.clone());
        }

        let url = format!(
            "{}/v1/audio/transcriptions",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| send_error("OpenAI transcription", e, self.config.timeout))?;
        let response = check_status("OpenAI transcription", response).await?;

        let body: WhisperJson = response.json().await.map_err(|e| {
            AiError::invalid_response(format!("Failed to parse transcription: {}", e))
        })?;
        Ok(body.into_segments())
    }

    fn name(&self) -> &str {
        "openai"
    }
}
