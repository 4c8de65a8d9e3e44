//! Gapless audio concatenation via the FFmpeg concat demuxer.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Render a concat demuxer list for `paths`, one `file '...'` entry per clip.
pub fn concat_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| {
            // Single quotes close, escape and reopen the quoted string
            let escaped = p.to_string_lossy().replace('\'', r"'\''");
            format!("file '{}'\n", escaped)
        })
        .collect()
}

/// Concatenate audio clips in the given order into a PCM WAV file.
///
/// No silence or cross-fade is inserted between clips. The list file is
/// written next to `output`.
pub async fn concat_audio(
    runner: &FfmpegRunner,
    clips: &[PathBuf],
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    let output = output.as_ref();
    if clips.is_empty() {
        return Err(MediaError::invalid_input("no audio clips to concatenate"));
    }
    if let Some(missing) = clips.iter().find(|p| !p.exists()) {
        return Err(MediaError::FileNotFound(missing.clone()));
    }

    let list_path = output.with_extension("concat.txt");
    tokio::fs::write(&list_path, concat_list(clips)).await?;
    debug!(clips = clips.len(), list = %list_path.display(), "Concatenating audio");

    let cmd = FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], &list_path)
        .output_arg("-vn")
        .audio_codec("pcm_s16le");

    let result = runner.run(&cmd).await;
    let _ = tokio::fs::remove_file(&list_path).await;
    result
}
