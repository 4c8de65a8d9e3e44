//! Narrated video pipeline.
//!
//! script → per-line synthesis → concatenation → transcription →
//! caption chunking → compositing. Each request runs in its own scratch
//! directory; the only file that outlives a run is the published video
//! (and its caption sidecar).

pub mod assembler;
pub mod captions;
pub mod compositor;
pub mod script;
pub mod speech;
pub mod transcription;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::watch;

use studycast_ai::text::{GeminiClient, GeminiConfig};
use studycast_ai::{DocumentAnalyzer, SpeechSynthesizer, TextGenerator, Transcriber};
use studycast_media::{concat_audio, probe_media, render_composite, ComposeJob, FfmpegRunner, MediaInfo};
use studycast_models::{GenerationRequest, RenderedArtifact};

use crate::config::{PipelineConfig, WorkerConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::scratch::ScratchDir;

use self::assembler::assemble_track;
use self::captions::chunk_transcript;
use self::compositor::composite;
use self::script::write_script;
use self::speech::{parse_script, SpeechStage};
use self::transcription::transcribe_track;

/// Media operations the pipeline needs.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Duration of an audio clip in seconds.
    async fn probe_duration(&self, path: &Path) -> WorkerResult<f64>;

    async fn probe_video(&self, path: &Path) -> WorkerResult<MediaInfo>;

    /// Gapless concatenation in the given order.
    async fn concat_audio(&self, clips: &[PathBuf], output: &Path) -> WorkerResult<()>;

    /// Encode and publish a composite; failures map to `EncodingFailed`.
    async fn render(&self, job: &ComposeJob) -> WorkerResult<()>;
}

/// [`MediaBackend`] backed by the ffmpeg/ffprobe CLIs.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    concat_timeout: Duration,
    encode_timeout: Duration,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl FfmpegBackend {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            concat_timeout: config.concat_timeout,
            encode_timeout: config.encode_timeout,
            cancel_rx: None,
        }
    }

    /// Kill running ffmpeg processes when `cancel_rx` turns true.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn runner(&self, timeout: Duration) -> FfmpegRunner {
        let runner = FfmpegRunner::new().with_timeout(timeout.as_secs());
        match &self.cancel_rx {
            Some(rx) => runner.with_cancel(rx.clone()),
            None => runner,
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_duration(&self, path: &Path) -> WorkerResult<f64> {
        Ok(probe_media(path).await?.duration)
    }

    async fn probe_video(&self, path: &Path) -> WorkerResult<MediaInfo> {
        Ok(probe_media(path).await?)
    }

    async fn concat_audio(&self, clips: &[PathBuf], output: &Path) -> WorkerResult<()> {
        let started = Instant::now();
        concat_audio(&self.runner(self.concat_timeout), clips, output).await?;
        metrics::record_stage_duration("concat", started.elapsed().as_secs_f64());
        Ok(())
    }

    async fn render(&self, job: &ComposeJob) -> WorkerResult<()> {
        let started = Instant::now();
        render_composite(&self.runner(self.encode_timeout), job)
            .await
            .map_err(WorkerError::from_encoding)?;
        metrics::record_stage_duration("encode", started.elapsed().as_secs_f64());
        Ok(())
    }
}

/// The external capabilities a generation needs.
#[derive(Clone)]
pub struct Capabilities {
    /// Writes podcast scripts
    pub script_text: Arc<dyn TextGenerator>,
    /// Writes notes, quizzes and plans
    pub text: Arc<dyn TextGenerator>,
    /// Reads uploaded documents; absent without Gemini credentials
    pub analyzer: Option<Arc<dyn DocumentAnalyzer>>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub media: Arc<dyn MediaBackend>,
}

impl Capabilities {
    /// Build every provider selected in `config`.
    pub fn from_config(config: &WorkerConfig, cancel_rx: watch::Receiver<bool>) -> WorkerResult<Self> {
        let ai = |e: studycast_ai::AiError| WorkerError::config_error(e.to_string());
        Ok(Self {
            script_text: config.script_provider.build_from_env().map_err(ai)?,
            text: config.text_provider.build_from_env().map_err(ai)?,
            analyzer: analyzer_from_env().map_err(ai)?,
            speech: config.speech_backend.build_from_env().map_err(ai)?,
            transcriber: config.transcriber.build_from_env().map_err(ai)?,
            media: Arc::new(FfmpegBackend::new(&config.pipeline).with_cancel(cancel_rx)),
        })
    }
}

fn analyzer_from_env() -> studycast_ai::AiResult<Option<Arc<dyn DocumentAnalyzer>>> {
    let config = GeminiConfig::analysis_from_env();
    if config.api_key.is_none() {
        return Ok(None);
    }
    Ok(Some(Arc::new(GeminiClient::new(config)?)))
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("script_text", &self.script_text.name())
            .field("text", &self.text.name())
            .field("analyzer", &self.analyzer.as_ref().map(|a| a.name()))
            .field("speech", &self.speech.name())
            .field("transcriber", &self.transcriber.name())
            .finish()
    }
}

/// Orchestrates one narrated video from subtopic to published file.
#[derive(Clone)]
pub struct VideoPipeline {
    caps: Capabilities,
    config: PipelineConfig,
    work_dir: PathBuf,
}

impl VideoPipeline {
    pub fn new(caps: Capabilities, config: PipelineConfig, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            caps,
            config,
            work_dir: work_dir.into(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for `request`.
    ///
    /// The scratch directory is dropped on every exit path, including when
    /// the returned future is dropped mid-flight.
    pub async fn run(&self, request: &GenerationRequest, logger: &JobLogger) -> WorkerResult<RenderedArtifact> {
        let label = request
            .output_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let scratch = ScratchDir::create_in(&self.work_dir, &label)?;
        logger.log_start(&format!("video for \"{}\"", request.subtopic_title));

        let stage = Instant::now();
        let script = write_script(self.caps.script_text.as_ref(), &self.config, request).await?;
        metrics::record_stage_duration("script", stage.elapsed().as_secs_f64());

        let parsed = parse_script(&script, &self.config.voices);
        if parsed.lines.is_empty() {
            return Err(WorkerError::NoDialogueLines);
        }
        logger.log_progress(&format!(
            "{} dialogue lines, {} skipped",
            parsed.lines.len(),
            parsed.skipped
        ));

        let stage = Instant::now();
        let segments = SpeechStage {
            synthesizer: self.caps.speech.as_ref(),
            media: self.caps.media.as_ref(),
            voices: &self.config.voices,
            concurrency: self.config.synthesis_concurrency,
            timeout: self.config.synthesis_timeout,
            mode: self.config.synthesis_mode,
        }
        .run(&parsed.lines, &scratch)
        .await?;
        metrics::record_stage_duration("synthesis", stage.elapsed().as_secs_f64());
        metrics::record_lines(segments.len(), parsed.lines.len() - segments.len() + parsed.skipped);
        if segments.len() < parsed.lines.len() {
            logger.log_warning(&format!(
                "{} of {} lines failed synthesis and were dropped",
                parsed.lines.len() - segments.len(),
                parsed.lines.len()
            ));
        }

        let track = assemble_track(
            self.caps.media.as_ref(),
            &segments,
            &scratch.join("full_audio.wav"),
        )
        .await?;

        let stage = Instant::now();
        let transcript = transcribe_track(
            self.caps.transcriber.as_ref(),
            &track,
            self.config.transcription_timeout,
            self.config.allow_uncaptioned,
        )
        .await?;
        metrics::record_stage_duration("transcription", stage.elapsed().as_secs_f64());

        let chunks = chunk_transcript(&transcript, self.config.max_caption_words);
        metrics::record_captions(chunks.len());
        logger.log_progress(&format!(
            "{:.1}s narration, {} captions",
            track.duration_secs,
            chunks.len()
        ));

        let artifact = composite(
            self.caps.media.as_ref(),
            &self.config,
            &track,
            &chunks,
            &scratch,
            &request.output_path,
        )
        .await?;

        logger.log_completion(&format!("{}", artifact.path.display()));
        Ok(artifact)
    }
}
