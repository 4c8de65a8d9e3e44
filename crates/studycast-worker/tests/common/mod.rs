//! In-memory capabilities for driving the pipeline without providers or ffmpeg.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use studycast_ai::{
    AiError, AiResult, DocumentAnalyzer, SourceDocument, SpeechSynthesizer, SynthesizedAudio, TextGenerator,
    Transcriber,
};
use studycast_media::{ComposeJob, MediaInfo};
use studycast_models::TranscriptSegment;
use studycast_worker::retry::RetryConfig;
use studycast_worker::{Capabilities, MediaBackend, PipelineConfig, WorkerError, WorkerResult};

/// Returns a fixed script, optionally failing the first calls as unavailable.
pub struct FakeText {
    pub response: String,
    pub fail_first: usize,
    pub calls: AtomicUsize,
}

impl FakeText {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail_first: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_first(mut self, n: usize) -> Self {
        self.fail_first = n;
        self
    }
}

#[async_trait]
impl TextGenerator for FakeText {
    async fn generate(&self, _prompt: &str) -> AiResult<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err(AiError::unavailable("503 overloaded"));
        }
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "fake-text"
    }
}

/// Returns a fixed analysis and records the documents it was shown.
pub struct FakeAnalyzer {
    pub response: String,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<(String, &'static str)>>,
}

impl FakeAnalyzer {
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentAnalyzer for FakeAnalyzer {
    async fn analyze_documents(&self, _prompt: &str, documents: &[SourceDocument]) -> AiResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .extend(documents.iter().map(|d| (d.name.clone(), d.mime_type)));
        Ok(self.response.clone())
    }

    fn name(&self) -> &str {
        "fake-analyzer"
    }
}

/// Encodes the utterance as the clip bytes; one second per byte.
/// Texts containing `FAIL` are rejected.
#[derive(Default)]
pub struct FakeSpeech {
    pub calls: AtomicUsize,
    pub voices: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn synthesize(&self, text: &str, voice: &str) -> AiResult<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voices
            .lock()
            .unwrap()
            .push((text.to_string(), voice.to_string()));
        if text.contains("FAIL") {
            return Err(AiError::request_failed("voice backend rejected text"));
        }
        // Later lines finish first to exercise reordering
        tokio::time::sleep(Duration::from_millis(20u64.saturating_sub(text.len() as u64))).await;
        Ok(SynthesizedAudio {
            bytes: text.as_bytes().to_vec(),
            extension: "mp3",
        })
    }

    fn name(&self) -> &str {
        "fake-speech"
    }
}

pub struct FakeTranscriber {
    pub segments: Vec<TranscriptSegment>,
    pub calls: AtomicUsize,
}

impl FakeTranscriber {
    pub fn new(segments: Vec<TranscriptSegment>) -> Self {
        Self {
            segments,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: &Path) -> AiResult<Vec<TranscriptSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.segments.clone())
    }

    fn name(&self) -> &str {
        "fake-transcriber"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBehavior {
    Succeed,
    Fail,
    Hang,
}

/// Media backend that concatenates bytes and records render jobs.
pub struct FakeMedia {
    pub background_secs: f64,
    pub render: RenderBehavior,
    pub concat_inputs: Mutex<Vec<PathBuf>>,
    pub jobs: Mutex<Vec<ComposeJob>>,
    /// Whether a caption sidecar sat beside the output when each render began
    pub sidecar_at_render: Mutex<Vec<bool>>,
    pub render_started: tokio::sync::Notify,
}

impl FakeMedia {
    pub fn new(background_secs: f64) -> Self {
        Self {
            background_secs,
            render: RenderBehavior::Succeed,
            concat_inputs: Mutex::new(Vec::new()),
            jobs: Mutex::new(Vec::new()),
            sidecar_at_render: Mutex::new(Vec::new()),
            render_started: tokio::sync::Notify::new(),
        }
    }

    pub fn with_render(mut self, render: RenderBehavior) -> Self {
        self.render = render;
        self
    }

    pub fn last_job(&self) -> Option<ComposeJob> {
        self.jobs.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl MediaBackend for FakeMedia {
    async fn probe_duration(&self, path: &Path) -> WorkerResult<f64> {
        Ok(tokio::fs::read(path).await?.len() as f64)
    }

    async fn probe_video(&self, _path: &Path) -> WorkerResult<MediaInfo> {
        Ok(MediaInfo {
            duration: self.background_secs,
            has_video: true,
            has_audio: true,
            width: 1080,
            height: 1920,
        })
    }

    async fn concat_audio(&self, clips: &[PathBuf], output: &Path) -> WorkerResult<()> {
        let mut joined = Vec::new();
        for clip in clips {
            joined.extend(tokio::fs::read(clip).await?);
        }
        tokio::fs::write(output, joined).await?;
        self.concat_inputs.lock().unwrap().extend(clips.iter().cloned());
        Ok(())
    }

    async fn render(&self, job: &ComposeJob) -> WorkerResult<()> {
        self.jobs.lock().unwrap().push(job.clone());
        self.sidecar_at_render
            .lock()
            .unwrap()
            .push(job.output.with_extension("srt").exists());
        self.render_started.notify_one();
        match self.render {
            RenderBehavior::Succeed => {
                if let Some(parent) = job.output.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&job.output, b"mp4").await?;
                Ok(())
            }
            RenderBehavior::Fail => Err(WorkerError::EncodingFailed("Unknown encoder 'libx264'".into())),
            RenderBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

pub struct Fakes {
    pub text: Arc<FakeText>,
    pub analyzer: Arc<FakeAnalyzer>,
    pub speech: Arc<FakeSpeech>,
    pub transcriber: Arc<FakeTranscriber>,
    pub media: Arc<FakeMedia>,
}

impl Fakes {
    pub fn new(script: &str, segments: Vec<TranscriptSegment>, media: FakeMedia) -> Self {
        Self {
            text: Arc::new(FakeText::new(script)),
            analyzer: Arc::new(FakeAnalyzer::new("Zellatmung: Glykolyse, Citratzyklus, Atmungskette")),
            speech: Arc::new(FakeSpeech::default()),
            transcriber: Arc::new(FakeTranscriber::new(segments)),
            media: Arc::new(media),
        }
    }

    pub fn with_text(mut self, text: FakeText) -> Self {
        self.text = Arc::new(text);
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            script_text: self.text.clone(),
            text: self.text.clone(),
            analyzer: Some(self.analyzer.clone()),
            speech: self.speech.clone(),
            transcriber: self.transcriber.clone(),
            media: self.media.clone(),
        }
    }
}

/// Pipeline settings with fast retries.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        background_video: PathBuf::from("stock_videos/mc.mp4"),
        text_gen_retry: RetryConfig::new("text_generation")
            .with_max_retries(2)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5)),
        ..PipelineConfig::default()
    }
}

/// Files left anywhere under `dir`.
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(entries) = std::fs::read_dir(dir) else {
        return out;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            out.extend(files_under(&path));
        } else {
            out.push(path);
        }
    }
    out
}
