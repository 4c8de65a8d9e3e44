//! Worker error types.

use std::time::Duration;
use thiserror::Error;

use studycast_ai::AiError;
use studycast_media::MediaError;
use studycast_models::{FailureKind, JobFailure};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Text generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Text generation rate limited")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Text generation rejected: {0}")]
    GenerationRejected(String),

    #[error("Script contained no recognized dialogue lines")]
    NoDialogueLines,

    #[error("Speech synthesis failed for line {line_index}: {message}")]
    SynthesisFailed { line_index: usize, message: String },

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Background video is {background_secs:.1}s but narration needs {narration_secs:.1}s")]
    BackgroundTooShort {
        background_secs: f64,
        narration_secs: f64,
    },

    #[error("Model output unusable: {0}")]
    InvalidModelOutput(String),

    #[error("Generation already in progress for {0}")]
    AlreadyInProgress(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{stage} timed out after {secs} seconds")]
    Timeout { stage: &'static str, secs: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn invalid_model_output(msg: impl Into<String>) -> Self {
        Self::InvalidModelOutput(msg.into())
    }

    pub fn transcription_failed(msg: impl Into<String>) -> Self {
        Self::TranscriptionFailed(msg.into())
    }

    /// Map a text-generation failure.
    pub fn from_generation(err: AiError) -> Self {
        match err {
            AiError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            AiError::Config(msg) => Self::ConfigError(msg),
            e if e.is_retryable() => Self::GenerationUnavailable(e.to_string()),
            e => Self::GenerationRejected(e.to_string()),
        }
    }

    /// Map a media failure from the encode step.
    pub fn from_encoding(err: MediaError) -> Self {
        match err {
            MediaError::Cancelled => Self::Cancelled,
            MediaError::Timeout(secs) => Self::Timeout {
                stage: "encoding",
                secs,
            },
            MediaError::FfmpegFailed {
                message, stderr, ..
            } => Self::EncodingFailed(match stderr {
                Some(stderr) => format!("{}: {}", message, stderr),
                None => message,
            }),
            other => Self::EncodingFailed(other.to_string()),
        }
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WorkerError::GenerationUnavailable(_)
                | WorkerError::RateLimited { .. }
                | WorkerError::SynthesisFailed { .. }
                | WorkerError::Timeout { .. }
        )
    }

    /// Server-requested delay before the next attempt.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            WorkerError::RateLimited {
                retry_after_secs: Some(secs),
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Classify for callers: retry later, give up on this input, or a local fault.
    pub fn failure_kind(&self) -> FailureKind {
        if self.is_retryable() {
            return FailureKind::Retryable;
        }
        match self {
            WorkerError::NoDialogueLines
            | WorkerError::TranscriptionFailed(_)
            | WorkerError::BackgroundTooShort { .. }
            | WorkerError::InvalidModelOutput(_)
            | WorkerError::GenerationRejected(_)
            | WorkerError::InvalidRequest(_)
            | WorkerError::NotFound(_)
            | WorkerError::AlreadyInProgress(_) => FailureKind::Unprocessable,
            _ => FailureKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            WorkerError::GenerationUnavailable(_) => "generation_unavailable",
            WorkerError::RateLimited { .. } => "rate_limited",
            WorkerError::GenerationRejected(_) => "generation_rejected",
            WorkerError::NoDialogueLines => "no_dialogue_lines",
            WorkerError::SynthesisFailed { .. } => "synthesis_failed",
            WorkerError::TranscriptionFailed(_) => "transcription_failed",
            WorkerError::EncodingFailed(_) => "encoding_failed",
            WorkerError::BackgroundTooShort { .. } => "background_too_short",
            WorkerError::InvalidModelOutput(_) => "invalid_model_output",
            WorkerError::AlreadyInProgress(_) => "already_in_progress",
            WorkerError::InvalidRequest(_) => "invalid_request",
            WorkerError::NotFound(_) => "not_found",
            WorkerError::Cancelled => "cancelled",
            WorkerError::Timeout { .. } => "timeout",
            WorkerError::ConfigError(_) => "config_error",
            WorkerError::Media(_) => "media_error",
            WorkerError::Io(_) => "io_error",
            WorkerError::Json(_) => "json_error",
        }
    }

    pub fn to_job_failure(&self) -> JobFailure {
        JobFailure {
            kind: self.failure_kind(),
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}
