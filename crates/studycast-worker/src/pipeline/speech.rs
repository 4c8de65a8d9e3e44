//! Script parsing and multi-voice synthesis.

use std::time::{Duration, Instant};

use futures::future::try_join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use studycast_ai::SpeechSynthesizer;
use studycast_models::{AudioSegment, DialogueLine, VoiceProfile};

use crate::config::SynthesisMode;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::MediaBackend;
use crate::scratch::ScratchDir;

/// Dialogue extracted from a raw script.
#[derive(Debug, Clone, Default)]
pub struct ParsedScript {
    pub lines: Vec<DialogueLine>,
    /// Non-empty lines that were not attributed to a known speaker
    pub skipped: usize,
}

/// Split a script into speaker-attributed lines.
///
/// Empty lines are dropped before indexing, so `index` is the position of
/// the line among the non-empty lines. A line counts when it starts with
/// `<Speaker>:` for a speaker in `voices` (exact, case-sensitive); anything
/// else is skipped, as is a labelled line with nothing after the label.
pub fn parse_script(script: &str, voices: &VoiceProfile) -> ParsedScript {
    let mut parsed = ParsedScript::default();

    for (index, line) in script
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .enumerate()
    {
        match voices.match_line(line) {
            Some((speaker, text)) if !text.is_empty() => parsed.lines.push(DialogueLine {
                index,
                speaker: speaker.to_string(),
                text: text.to_string(),
            }),
            Some((speaker, _)) => {
                debug!(index, speaker, "Skipping empty dialogue line");
                parsed.skipped += 1;
            }
            None => {
                debug!(index, line, "Skipping line without a known speaker");
                parsed.skipped += 1;
            }
        }
    }

    parsed
}

/// Bounded concurrent synthesis of every line.
pub struct SpeechStage<'a> {
    pub synthesizer: &'a dyn SpeechSynthesizer,
    pub media: &'a dyn MediaBackend,
    pub voices: &'a VoiceProfile,
    pub concurrency: usize,
    pub timeout: Duration,
    pub mode: SynthesisMode,
}

impl SpeechStage<'_> {
    /// Synthesize `lines` into clips under `scratch`.
    ///
    /// Returned segments are ordered by line index regardless of completion
    /// order. In lenient mode a failed line is logged and left out; in
    /// strict mode the first failure aborts the remaining calls. When every
    /// line fails, the last failure is returned in either mode.
    pub async fn run(&self, lines: &[DialogueLine], scratch: &ScratchDir) -> WorkerResult<Vec<AudioSegment>> {
        let permits = Semaphore::new(self.concurrency.max(1));
        let permits = &permits;

        let tasks = lines.iter().map(|line| async move {
            let _permit = permits
                .acquire()
                .await
                .map_err(|_| WorkerError::Cancelled)?;

            match self.synthesize_line(line, scratch).await {
                Ok(segment) => Ok(Ok(segment)),
                Err(message) => match self.mode {
                    SynthesisMode::Strict => Err(WorkerError::SynthesisFailed {
                        line_index: line.index,
                        message,
                    }),
                    SynthesisMode::Lenient => {
                        warn!(
                            line_index = line.index,
                            speaker = %line.speaker,
                            error = %message,
                            "Dropping line after synthesis failure"
                        );
                        Ok(Err((line.index, message)))
                    }
                },
            }
        });

        let mut segments = Vec::with_capacity(lines.len());
        let mut last_failure: Option<(usize, String)> = None;
        for outcome in try_join_all(tasks).await? {
            match outcome {
                Ok(segment) => segments.push(segment),
                Err(failure) => {
                    if last_failure.as_ref().map_or(true, |(index, _)| failure.0 > *index) {
                        last_failure = Some(failure);
                    }
                }
            }
        }

        if segments.is_empty() {
            if let Some((line_index, message)) = last_failure {
                return Err(WorkerError::SynthesisFailed { line_index, message });
            }
        }

        segments.sort_by_key(|s| s.line_index);
        Ok(segments)
    }

    async fn synthesize_line(&self, line: &DialogueLine, scratch: &ScratchDir) -> Result<AudioSegment, String> {
        let voice = self
            .voices
            .voice_for(&line.speaker)
            .ok_or_else(|| format!("no voice configured for {}", line.speaker))?;

        let started = Instant::now();
        let audio = tokio::time::timeout(self.timeout, self.synthesizer.synthesize(&line.text, voice))
            .await
            .map_err(|_| format!("timed out after {}s", self.timeout.as_secs()))?
            .map_err(|e| e.to_string())?;
        if audio.bytes.is_empty() {
            return Err("synthesizer returned no audio".to_string());
        }

        let path = scratch.clip_path(line.index, audio.extension);
        tokio::fs::write(&path, &audio.bytes)
            .await
            .map_err(|e| format!("failed to write clip: {}", e))?;

        let duration_secs = self
            .media
            .probe_duration(&path)
            .await
            .map_err(|e| format!("unreadable clip: {}", e))?;

        debug!(
            line_index = line.index,
            speaker = %line.speaker,
            voice,
            duration_secs,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Synthesized line"
        );

        Ok(AudioSegment {
            line_index: line.index,
            speaker: line.speaker.clone(),
            path,
            duration_secs,
        })
    }
}
