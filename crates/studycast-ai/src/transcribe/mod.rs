//! Speech-to-text backends producing timed segments.

mod openai;
mod whisper_cli;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use studycast_models::TranscriptSegment;

use crate::error::{AiError, AiResult};

pub use openai::{OpenAiTranscriptionClient, OpenAiTranscriptionConfig};
pub use whisper_cli::{WhisperCli, WhisperCliConfig};

/// Audio file in, timed segments out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Segments are returned as the engine produced them; ordering and
    /// bounds are normalized by the caller.
    async fn transcribe(&self, audio: &Path) -> AiResult<Vec<TranscriptSegment>>;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriberBackend {
    /// Local `whisper` CLI (openai-whisper)
    WhisperCli,
    /// OpenAI `/v1/audio/transcriptions`
    OpenAi,
}

impl TranscriberBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriberBackend::WhisperCli => "whisper-cli",
            TranscriberBackend::OpenAi => "openai",
        }
    }

    pub fn build_from_env(&self) -> AiResult<Arc<dyn Transcriber>> {
        Ok(match self {
            TranscriberBackend::WhisperCli => Arc::new(WhisperCli::new(WhisperCliConfig::from_env())),
            TranscriberBackend::OpenAi => Arc::new(OpenAiTranscriptionClient::new(
                OpenAiTranscriptionConfig::from_env(),
            )?),
        })
    }
}

impl fmt::Display for TranscriberBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriberBackend {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whisper-cli" | "whisper" => Ok(TranscriberBackend::WhisperCli),
            "openai" => Ok(TranscriberBackend::OpenAi),
            other => Err(AiError::config(format!("unknown transcriber '{}'", other))),
        }
    }
}

/// Whisper-style JSON shared by the CLI output file and `verbose_json`.
#[derive(Debug, Deserialize)]
struct WhisperJson {
    #[serde(default)]
    segments: Vec<WhisperSegment>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    #[serde(default)]
    text: String,
}

impl WhisperJson {
    fn into_segments(self) -> Vec<TranscriptSegment> {
        self.segments
            .into_iter()
            .map(|s| TranscriptSegment::new(s.start, s.end, s.text))
            .collect()
    }
}
