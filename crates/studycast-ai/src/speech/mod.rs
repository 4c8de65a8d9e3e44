//! Speech synthesis backends.

mod edge;
mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AiError, AiResult};

pub use edge::{EdgeTtsCli, EdgeTtsConfig};
pub use openai::{OpenAiSpeechClient, OpenAiSpeechConfig};

/// Encoded audio for one utterance.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    /// File extension matching the encoding, e.g. `mp3`
    pub extension: &'static str,
}

/// Text and voice in, audio out.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice: &str) -> AiResult<SynthesizedAudio>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechBackend {
    /// Local `edge-tts` CLI (Microsoft neural voices)
    EdgeTts,
    /// OpenAI `/v1/audio/speech`
    OpenAi,
}

impl SpeechBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpeechBackend::EdgeTts => "edge-tts",
            SpeechBackend::OpenAi => "openai",
        }
    }

    pub fn build_from_env(&self) -> AiResult<Arc<dyn SpeechSynthesizer>> {
        Ok(match self {
            SpeechBackend::EdgeTts => Arc::new(EdgeTtsCli::new(EdgeTtsConfig::from_env())),
            SpeechBackend::OpenAi => {
                Arc::new(OpenAiSpeechClient::new(OpenAiSpeechConfig::from_env())?)
            }
        })
    }
}

impl fmt::Display for SpeechBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpeechBackend {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "edge-tts" | "edge" => Ok(SpeechBackend::EdgeTts),
            "openai" => Ok(SpeechBackend::OpenAi),
            other => Err(AiError::config(format!("unknown speech backend '{}'", other))),
        }
    }
}
