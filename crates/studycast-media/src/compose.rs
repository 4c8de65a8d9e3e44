//! Background video + narration + captions compositing.

use std::path::PathBuf;
use tracing::{debug, info};

use studycast_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::StagingFile;

/// Everything needed to render one narrated, captioned video.
#[derive(Debug, Clone)]
pub struct ComposeJob {
    /// Background clip; its own audio is discarded
    pub background: PathBuf,
    /// Assembled narration track
    pub narration: PathBuf,
    /// Narration length; the output is trimmed to exactly this
    pub narration_secs: f64,
    /// Repeat the background when it is shorter than the narration
    pub loop_background: bool,
    /// ASS caption file to burn in, if any
    pub captions: Option<PathBuf>,
    pub encoding: EncodingConfig,
    /// Final path; only written by an atomic rename after a clean encode
    pub output: PathBuf,
}

impl ComposeJob {
    /// Build the FFmpeg invocation that renders into `target`.
    pub fn build_command(&self, target: impl Into<PathBuf>) -> FfmpegCommand {
        let background_args: Vec<&str> = if self.loop_background {
            vec!["-stream_loop", "-1"]
        } else {
            Vec::new()
        };

        let mut cmd = FfmpegCommand::new(target.into())
            .input_with_args(background_args, &self.background)
            .input(&self.narration)
            .map("0:v:0")
            .map("1:a:0");

        if let Some(captions) = &self.captions {
            cmd = cmd.video_filter(format!("ass={}", escape_filter_path(&captions.to_string_lossy())));
        }

        cmd.duration(self.narration_secs)
            .output_args(self.encoding.to_ffmpeg_args())
            .output_args(["-movflags", "+faststart"])
    }
}

/// Escape a path for use as a filter option inside an `-vf` graph.
///
/// Option values treat `\ ' :` specially and the graph parser additionally
/// treats `\ ' [ ] , ;`, so both levels are applied.
pub fn escape_filter_path(path: &str) -> String {
    let mut option_level = String::with_capacity(path.len());
    for c in path.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option_level.push('\\');
        }
        option_level.push(c);
    }

    let mut graph_level = String::with_capacity(option_level.len());
    for c in option_level.chars() {
        if matches!(c, '\\' | '\'' | '[' | ']' | ',' | ';') {
            graph_level.push('\\');
        }
        graph_level.push(c);
    }
    graph_level
}

/// Render `job` and publish the result at `job.output`.
///
/// On any failure the staging file is removed and nothing appears at the
/// output path.
pub async fn render_composite(runner: &FfmpegRunner, job: &ComposeJob) -> MediaResult<()> {
    if !(job.narration_secs > 0.0) {
        return Err(MediaError::invalid_input(format!(
            "narration duration must be positive, got {}",
            job.narration_secs
        )));
    }
    for input in [&job.background, &job.narration] {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.clone()));
        }
    }

    if let Some(parent) = job.output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let staging = StagingFile::for_destination(&job.output);
    let cmd = job.build_command(staging.path());

    info!(
        output = %job.output.display(),
        duration_secs = job.narration_secs,
        looped = job.loop_background,
        captioned = job.captions.is_some(),
        "Rendering composite video"
    );

    let total_ms = (job.narration_secs * 1000.0) as i64;
    runner
        .run_with_progress(&cmd, move |progress| {
            debug!(
                percent = progress.percentage(total_ms),
                speed = progress.speed,
                "Encoding progress"
            );
        })
        .await?;

    staging.publish(&job.output).await
}
