//! Narration track assembly.

use std::path::{Path, PathBuf};

use tracing::info;

use studycast_models::{AssembledTrack, AudioSegment};

use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::MediaBackend;

/// Concatenate clips in line order, with no gap or cross-fade.
///
/// The track duration is the sum of the clip durations; it is what the
/// video gets trimmed to.
pub async fn assemble_track(
    media: &dyn MediaBackend,
    segments: &[AudioSegment],
    output: &Path,
) -> WorkerResult<AssembledTrack> {
    if segments.is_empty() {
        return Err(WorkerError::NoDialogueLines);
    }

    let mut ordered: Vec<&AudioSegment> = segments.iter().collect();
    ordered.sort_by_key(|s| s.line_index);
    let clips: Vec<PathBuf> = ordered.iter().map(|s| s.path.clone()).collect();

    media.concat_audio(&clips, output).await?;

    let track = AssembledTrack::from_segments(output, segments);
    info!(
        segments = track.segment_count,
        duration_secs = track.duration_secs,
        "Assembled narration track"
    );
    Ok(track)
}
