//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use studycast_ai::{SpeechBackend, TextProvider, TranscriberBackend};
use studycast_media::CaptionStyle;
use studycast_models::{EncodingConfig, VoiceProfile};

use crate::error::{WorkerError, WorkerResult};
use crate::retry::RetryConfig;

/// What to do when one dialogue line cannot be synthesized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisMode {
    /// Log and drop the line; the video skips it
    #[default]
    Lenient,
    /// Fail the whole request
    Strict,
}

impl FromStr for SynthesisMode {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(SynthesisMode::Lenient),
            "strict" => Ok(SynthesisMode::Strict),
            other => Err(WorkerError::config_error(format!(
                "SYNTHESIS_MODE must be lenient or strict, got '{}'",
                other
            ))),
        }
    }
}

/// What to do when the background clip is shorter than the narration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPolicy {
    /// Repeat the background until the narration ends
    #[default]
    Loop,
    /// Fail with `BackgroundTooShort`
    Fail,
}

impl FromStr for BackgroundPolicy {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loop" => Ok(BackgroundPolicy::Loop),
            "fail" => Ok(BackgroundPolicy::Fail),
            other => Err(WorkerError::config_error(format!(
                "BACKGROUND_POLICY must be loop or fail, got '{}'",
                other
            ))),
        }
    }
}

/// Settings for the video pipeline stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stock clip placed behind the narration
    pub background_video: PathBuf,
    pub voices: VoiceProfile,
    /// Language the script is written in
    pub script_language: String,
    pub script_word_target: usize,
    pub script_chapters: usize,
    /// Maximum words per on-screen caption
    pub max_caption_words: usize,
    /// Concurrent synthesis calls per request
    pub synthesis_concurrency: usize,
    pub synthesis_mode: SynthesisMode,
    pub background_policy: BackgroundPolicy,
    /// Publish the video without captions when transcription yields nothing
    pub allow_uncaptioned: bool,
    /// Write an `.srt` next to the published video
    pub write_srt_sidecar: bool,
    pub text_gen_timeout: Duration,
    /// Limit for one document-analysis call
    pub analysis_timeout: Duration,
    /// Upper bound on document bytes sent in one analysis request
    pub analysis_max_bytes: u64,
    pub synthesis_timeout: Duration,
    pub transcription_timeout: Duration,
    pub concat_timeout: Duration,
    pub encode_timeout: Duration,
    /// Backoff for retryable text-generation failures
    pub text_gen_retry: RetryConfig,
    pub encoding: EncodingConfig,
    pub caption_style: CaptionStyle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            background_video: PathBuf::from("stock_videos/mc.mp4"),
            voices: VoiceProfile::default(),
            script_language: "German".to_string(),
            script_word_target: 500,
            script_chapters: 3,
            max_caption_words: 5,
            synthesis_concurrency: 4,
            synthesis_mode: SynthesisMode::Lenient,
            background_policy: BackgroundPolicy::Loop,
            allow_uncaptioned: false,
            write_srt_sidecar: true,
            text_gen_timeout: Duration::from_secs(120),
            analysis_timeout: Duration::from_secs(300),
            analysis_max_bytes: 20 * 1024 * 1024,
            synthesis_timeout: Duration::from_secs(60),
            transcription_timeout: Duration::from_secs(900),
            concat_timeout: Duration::from_secs(120),
            encode_timeout: Duration::from_secs(1800),
            text_gen_retry: RetryConfig::new("text_generation")
                .with_max_retries(3)
                .with_base_delay(Duration::from_secs(2))
                .with_max_delay(Duration::from_secs(30)),
            encoding: EncodingConfig::default(),
            caption_style: CaptionStyle::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> WorkerResult<Self> {
        let d = Self::default();

        let voices = match env_var("VOICE_PROFILE") {
            Some(spec) => VoiceProfile::parse(&spec)
                .map_err(|e| WorkerError::config_error(format!("VOICE_PROFILE: {}", e)))?,
            None => d.voices,
        };

        let mut encoding = d.encoding;
        if let Some(preset) = env_var("VIDEO_PRESET") {
            encoding = encoding.with_preset(preset);
        }
        let crf = encoding.crf;
        encoding = encoding.with_crf(env_parse("VIDEO_CRF", crf));

        Ok(Self {
            background_video: env_var("BACKGROUND_VIDEO")
                .map(PathBuf::from)
                .unwrap_or(d.background_video),
            voices,
            script_language: env_var("SCRIPT_LANGUAGE").unwrap_or(d.script_language),
            script_word_target: env_parse("SCRIPT_WORD_TARGET", d.script_word_target),
            script_chapters: env_parse("SCRIPT_CHAPTERS", d.script_chapters),
            max_caption_words: env_parse("CAPTION_MAX_WORDS", d.max_caption_words).max(1),
            synthesis_concurrency: env_parse("SYNTHESIS_CONCURRENCY", d.synthesis_concurrency)
                .max(1),
            synthesis_mode: env_var("SYNTHESIS_MODE")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(d.synthesis_mode),
            background_policy: env_var("BACKGROUND_POLICY")
                .map(|s| s.parse())
                .transpose()?
                .unwrap_or(d.background_policy),
            allow_uncaptioned: env_parse("ALLOW_UNCAPTIONED", d.allow_uncaptioned),
            write_srt_sidecar: env_parse("WRITE_SRT_SIDECAR", d.write_srt_sidecar),
            text_gen_timeout: env_secs("TEXT_GEN_TIMEOUT_SECS", d.text_gen_timeout),
            analysis_timeout: env_secs("ANALYSIS_TIMEOUT_SECS", d.analysis_timeout),
            analysis_max_bytes: env_parse("ANALYSIS_MAX_BYTES", d.analysis_max_bytes),
            synthesis_timeout: env_secs("SYNTHESIS_TIMEOUT_SECS", d.synthesis_timeout),
            transcription_timeout: env_secs("TRANSCRIPTION_TIMEOUT_SECS", d.transcription_timeout),
            concat_timeout: env_secs("CONCAT_TIMEOUT_SECS", d.concat_timeout),
            encode_timeout: env_secs("ENCODE_TIMEOUT_SECS", d.encode_timeout),
            text_gen_retry: d
                .text_gen_retry
                .with_max_retries(env_parse("TEXT_GEN_RETRIES", 3)),
            encoding,
            caption_style: d.caption_style,
        })
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent generation jobs
    pub max_concurrent_jobs: usize,
    /// Overall limit for one job
    pub job_timeout: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
    /// Parent directory for per-request scratch directories
    pub work_dir: PathBuf,
    /// Root of the per-user project tree
    pub uploads_root: PathBuf,
    /// Provider writing podcast scripts
    pub script_provider: TextProvider,
    /// Provider writing notes, quizzes and plans
    pub text_provider: TextProvider,
    pub speech_backend: SpeechBackend,
    pub transcriber: TranscriberBackend,
    /// Finished job records kept for status queries
    pub max_job_history: usize,
    pub pipeline: PipelineConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            job_timeout: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(30),
            work_dir: std::env::temp_dir().join("studycast"),
            uploads_root: PathBuf::from("uploads"),
            script_provider: TextProvider::OpenAi,
            text_provider: TextProvider::Gemini,
            speech_backend: SpeechBackend::EdgeTts,
            transcriber: TranscriberBackend::WhisperCli,
            max_job_history: 1000,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> WorkerResult<Self> {
        let d = Self::default();
        let ai = |e: studycast_ai::AiError| WorkerError::config_error(e.to_string());

        Ok(Self {
            max_concurrent_jobs: env_parse("WORKER_MAX_JOBS", d.max_concurrent_jobs).max(1),
            job_timeout: env_secs("WORKER_JOB_TIMEOUT", d.job_timeout),
            shutdown_timeout: env_secs("WORKER_SHUTDOWN_TIMEOUT", d.shutdown_timeout),
            work_dir: env_var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(d.work_dir),
            uploads_root: env_var("UPLOADS_ROOT")
                .map(PathBuf::from)
                .unwrap_or(d.uploads_root),
            script_provider: env_var("SCRIPT_PROVIDER")
                .map(|s| s.parse())
                .transpose()
                .map_err(ai)?
                .unwrap_or(d.script_provider),
            text_provider: env_var("TEXT_PROVIDER")
                .map(|s| s.parse())
                .transpose()
                .map_err(ai)?
                .unwrap_or(d.text_provider),
            speech_backend: env_var("SPEECH_BACKEND")
                .map(|s| s.parse())
                .transpose()
                .map_err(ai)?
                .unwrap_or(d.speech_backend),
            transcriber: env_var("TRANSCRIBER")
                .map(|s| s.parse())
                .transpose()
                .map_err(ai)?
                .unwrap_or(d.transcriber),
            max_job_history: env_parse("WORKER_JOB_HISTORY", d.max_job_history),
            pipeline: PipelineConfig::from_env()?,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env_var(name)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secs(name: &str, default: Duration) -> Duration {
    env_var(name)
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(default)
}
