//! `edge-tts` command-line backend.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::{SpeechSynthesizer, SynthesizedAudio};
use crate::env;
use crate::error::{AiError, AiResult};
use crate::process::run_tool;

#[derive(Debug, Clone)]
pub struct EdgeTtsConfig {
    /// Executable name or path
    pub program: String,
    /// Per-utterance timeout
    pub timeout: Duration,
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            program: "edge-tts".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl EdgeTtsConfig {
    pub fn from_env() -> Self {
        Self {
            program: env::var_or("EDGE_TTS_BIN", "edge-tts"),
            timeout: env::secs_or("SYNTHESIS_TIMEOUT_SECS", 60),
        }
    }
}

pub struct EdgeTtsCli {
    config: EdgeTtsConfig,
}

impl EdgeTtsCli {
    pub fn new(config: EdgeTtsConfig) -> Self {
        Self { config }
    }

    fn args(text: &str, voice: &str, media_path: &str) -> Vec<String> {
        vec![
            format!("--voice={}", voice),
            // `=` form keeps utterances starting with '-' from parsing as flags
            format!("--text={}", text),
            format!("--write-media={}", media_path),
        ]
    }
}

#[async_trait]
impl SpeechSynthesizer for EdgeTtsCli {
    async fn synthesize(&self, text: &str, voice: &str) -> AiResult<SynthesizedAudio> {
        let media = tempfile::Builder::new()
            .prefix("edge-tts-")
            .suffix(".mp3")
            .tempfile()?;
        let media_path = media.path().to_string_lossy().to_string();

        run_tool(
            &self.config.program,
            Self::args(text, voice, &media_path),
            self.config.timeout,
        )
        .await?;

        let bytes = tokio::fs::read(media.path()).await?;
        if bytes.is_empty() {
            return Err(AiError::tool_failed(
                self.config.program.clone(),
                "produced no audio",
            ));
        }
        debug!(voice, bytes = bytes.len(), "edge-tts synthesized utterance");

        Ok(SynthesizedAudio {
            bytes,
            extension: "mp3",
        })
    }

    fn name(&self) -> &str {
        "edge-tts"
    }
}
