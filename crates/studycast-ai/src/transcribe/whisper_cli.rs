//! `whisper` command-line backend.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use studycast_models::TranscriptSegment;
use tracing::info;

use super::{Transcriber, WhisperJson};
use crate::env;
use crate::error::{AiError, AiResult};
use crate::process::run_tool;

#[derive(Debug, Clone)]
pub struct WhisperCliConfig {
    pub program: String,
    /// Model size, e.g. `medium`
    pub model: String,
    /// Spoken language hint; `None` lets whisper detect it
    pub language: Option<String>,
    pub timeout: Duration,
}

impl Default for WhisperCliConfig {
    fn default() -> Self {
        Self {
            program: "whisper".to_string(),
            model: "medium".to_string(),
            language: Some("de".to_string()),
            timeout: Duration::from_secs(900),
        }
    }
}

impl WhisperCliConfig {
    pub fn from_env() -> Self {
        Self {
            program: env::var_or("WHISPER_BIN", "whisper"),
            model: env::var_or("WHISPER_MODEL", "medium"),
            language: Some(env::var_or("TRANSCRIPTION_LANGUAGE", "de"))
                .filter(|l| l != "auto"),
            timeout: env::secs_or("TRANSCRIPTION_TIMEOUT_SECS", 900),
        }
    }
}

pub struct WhisperCli {
    config: WhisperCliConfig,
}

impl WhisperCli {
    pub fn new(config: WhisperCliConfig) -> Self {
        Self { config }
    }

    fn args(&self, audio: &Path, output_dir: &Path) -> Vec<String> {
        let mut args = vec![
            audio.to_string_lossy().to_string(),
            "--model".to_string(),
            self.config.model.clone(),
            "--output_format".to_string(),
            "json".to_string(),
            "--output_dir".to_string(),
            output_dir.to_string_lossy().to_string(),
            "--verbose".to_string(),
            "False".to_string(),
        ];
        if let Some(language) = &self.config.language {
            args.push("--language".to_string());
            args.push(language.clone());
        }
        args
    }
}

#[async_trait]
impl Transcriber for WhisperCli {
    async fn transcribe(&self, audio: &Path) -> AiResult<Vec<TranscriptSegment>> {
        let output_dir = tempfile::tempdir()?;

        run_tool(
            &self.config.program,
            self.args(audio, output_dir.path()),
            self.config.timeout,
        )
        .await?;

        // whisper names its output after the input stem
        let stem = audio
            .file_stem()
            .ok_or_else(|| AiError::invalid_response("audio path has no file name"))?;
        let json_path = output_dir
            .path()
            .join(format!("{}.json", stem.to_string_lossy()));
        let raw = tokio::fs::read(&json_path).await.map_err(|e| {
            AiError::tool_failed(
                self.config.program.clone(),
                format!("missing output {}: {}", json_path.display(), e),
            )
        })?;

        let segments = serde_json::from_slice::<WhisperJson>(&raw)?.into_segments();
        info!(
            model = %self.config.model,
            segments = segments.len(),
            "whisper transcription finished"
        );
        Ok(segments)
    }

    fn name(&self) -> &str {
        "whisper-cli"
    }
}
