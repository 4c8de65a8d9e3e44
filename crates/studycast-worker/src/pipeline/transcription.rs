//! Transcription of the narration track and segment normalization.

use std::time::Duration;

use tracing::{info, warn};

use studycast_ai::{AiError, Transcriber};
use studycast_models::{AssembledTrack, TranscriptSegment};

use crate::error::{WorkerError, WorkerResult};

/// Make engine output safe to time captions against.
///
/// Text is trimmed, segments are stably sorted by start, anything starting
/// at or beyond `track_secs` is dropped and every end is clamped into
/// `[start, track_secs]`.
pub fn normalize_segments(raw: Vec<TranscriptSegment>, track_secs: f64) -> Vec<TranscriptSegment> {
    let mut segments: Vec<TranscriptSegment> = raw
        .into_iter()
        .filter(|s| s.start.is_finite() && s.end.is_finite())
        .map(|s| TranscriptSegment {
            start: s.start.max(0.0),
            end: s.end,
            text: s.text.trim().to_string(),
        })
        .filter(|s| s.start < track_secs)
        .collect();

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));
    for s in &mut segments {
        s.end = s.end.min(track_secs).max(s.start);
    }
    segments
}

/// Transcribe `track` and normalize the result.
///
/// A track that yields no usable text fails with `TranscriptionFailed`
/// unless `allow_uncaptioned` is set, in which case an empty transcript is
/// returned and the video is published without captions.
pub async fn transcribe_track(
    transcriber: &dyn Transcriber,
    track: &AssembledTrack,
    timeout: Duration,
    allow_uncaptioned: bool,
) -> WorkerResult<Vec<TranscriptSegment>> {
    let raw = match tokio::time::timeout(timeout, transcriber.transcribe(&track.path)).await {
        Err(_) => {
            return Err(WorkerError::Timeout {
                stage: "transcription",
                secs: timeout.as_secs(),
            })
        }
        Ok(Err(AiError::Timeout(secs))) => {
            return Err(WorkerError::Timeout {
                stage: "transcription",
                secs,
            })
        }
        Ok(Err(e)) => return Err(WorkerError::transcription_failed(e.to_string())),
        Ok(Ok(raw)) => raw,
    };

    let raw_count = raw.len();
    let segments = normalize_segments(raw, track.duration_secs);
    let usable = segments.iter().any(|s| !s.text.is_empty());

    if !usable && track.duration_secs > 0.0 {
        if allow_uncaptioned {
            warn!(
                engine = transcriber.name(),
                duration_secs = track.duration_secs,
                "Transcript is empty, continuing without captions"
            );
            return Ok(Vec::new());
        }
        return Err(WorkerError::transcription_failed(format!(
            "{} returned no speech for a {:.1}s track",
            transcriber.name(),
            track.duration_secs
        )));
    }

    info!(
        engine = transcriber.name(),
        raw = raw_count,
        kept = segments.len(),
        "Transcribed narration"
    );
    Ok(segments)
}
