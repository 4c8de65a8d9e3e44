//! OpenAI text-to-speech client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::{SpeechSynthesizer, SynthesizedAudio};
use crate::env;
use crate::error::{AiError, AiResult};
use crate::http::{build_client, check_status, send_error};
use crate::text::DEFAULT_OPENAI_BASE_URL;

#[derive(Debug, Clone)]
pub struct OpenAiSpeechConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OpenAiSpeechConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAiSpeechConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("OPENAI_API_KEY"),
            base_url: env::var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: env::var_or("OPENAI_TTS_MODEL", &defaults.model),
            timeout: env::secs_or("SYNTHESIS_TIMEOUT_SECS", 60),
        }
    }
}

pub struct OpenAiSpeechClient {
    api_key: String,
    client: Client,
    config: OpenAiSpeechConfig,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

impl OpenAiSpeechClient {
    pub fn new(config: OpenAiSpeechConfig) -> AiResult<Self> {
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
impl SpeechSynthesizer for OpenAiSpeechClient {
    async fn synthesize(&self, text: &str, voice: &str) -> AiResult<SynthesizedAudio> {
        let url = format!("{}/v1/audio/speech", self.config.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&SpeechRequest {
                model: &self.config.model,
                input: text,
                voice,
                response_format: "mp3",
            })
            .send()
            .await
            .map_err(|e| send_error("OpenAI speech", e, self.config.timeout))?;
        let response = check_status("OpenAI speech", response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| send_error("OpenAI speech", e, self.config.timeout))?;
        if bytes.is_empty() {
            return Err(AiError::invalid_response("empty audio body"));
        }

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            extension: "mp3",
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenAiSpeechClient {
        OpenAiSpeechClient::new(OpenAiSpeechConfig {
            api_key: Some("sk-test".into()),
            base_url: server.uri(),
            model: "tts-test".into(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_returns_audio_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(body_partial_json(serde_json::json!({"voice": "onyx", "input": "Hallo"})))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .mount(&server)
            .await;

        let audio = client(&server).synthesize("Hallo", "onyx").await.unwrap();
        assert_eq!(audio.bytes, vec![0xFF, 0xFB, 0x90]);
        assert_eq!(audio.extension, "mp3");
    }

    #[tokio::test]
    async fn test_empty_body_is_invalid() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = client(&server).synthesize("Hallo", "onyx").await;
        assert!(matches!(result, Err(AiError::InvalidResponse(_))));
    }
}
