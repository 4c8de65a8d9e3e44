//! Final video compositing.

use std::path::Path;

use tracing::{debug, info, warn};

use studycast_media::{build_ass, build_srt, write_atomically, ComposeJob};
use studycast_models::{AssembledTrack, CaptionChunk, RenderedArtifact};

use crate::config::{BackgroundPolicy, PipelineConfig};
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::MediaBackend;
use crate::scratch::ScratchDir;

/// Frame size assumed when the background reports none.
const FALLBACK_FRAME: (u32, u32) = (1080, 1920);

/// Render the background, narration and captions into `output`.
///
/// The background is probed first so a too-short clip is rejected under
/// [`BackgroundPolicy::Fail`] before anything is encoded. The encoded file
/// only appears at `output` after a clean encode, and by then the `.srt`
/// sidecar beside it already matches its captions.
pub async fn composite(
    media: &dyn MediaBackend,
    config: &PipelineConfig,
    track: &AssembledTrack,
    chunks: &[CaptionChunk],
    scratch: &ScratchDir,
    output: &Path,
) -> WorkerResult<RenderedArtifact> {
    let background = media.probe_video(&config.background_video).await?;
    if !background.has_video {
        return Err(WorkerError::config_error(format!(
            "background {} has no video stream",
            config.background_video.display()
        )));
    }

    let loop_background = if background.duration < track.duration_secs {
        match config.background_policy {
            BackgroundPolicy::Loop => true,
            BackgroundPolicy::Fail => {
                return Err(WorkerError::BackgroundTooShort {
                    background_secs: background.duration,
                    narration_secs: track.duration_secs,
                })
            }
        }
    } else {
        false
    };

    let frame = if background.width > 0 && background.height > 0 {
        (background.width, background.height)
    } else {
        FALLBACK_FRAME
    };

    let captions = if chunks.is_empty() {
        None
    } else {
        let path = scratch.join("captions.ass");
        tokio::fs::write(&path, build_ass(chunks, &config.caption_style, frame)).await?;
        Some(path)
    };

    let job = ComposeJob {
        background: config.background_video.clone(),
        narration: track.path.clone(),
        narration_secs: track.duration_secs,
        loop_background,
        captions,
        encoding: config.encoding.clone(),
        output: output.to_path_buf(),
    };

    // Sidecar is settled before the video lands; an uncaptioned render drops the old one.
    let sidecar = output.with_extension("srt");
    let wrote_sidecar = if config.write_srt_sidecar && !chunks.is_empty() {
        match write_atomically(&sidecar, build_srt(chunks)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %sidecar.display(), error = %e, "Failed to write caption sidecar");
                remove_stale_sidecar(&sidecar).await;
                false
            }
        }
    } else {
        remove_stale_sidecar(&sidecar).await;
        false
    };

    if let Err(e) = media.render(&job).await {
        if wrote_sidecar {
            remove_stale_sidecar(&sidecar).await;
        }
        return Err(e);
    }

    info!(
        output = %output.display(),
        duration_secs = track.duration_secs,
        captions = chunks.len(),
        looped = loop_background,
        "Published video"
    );

    Ok(RenderedArtifact {
        path: output.to_path_buf(),
        duration_secs: Some(track.duration_secs),
        caption_count: chunks.len(),
    })
}

async fn remove_stale_sidecar(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed caption sidecar"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove caption sidecar"),
    }
}
