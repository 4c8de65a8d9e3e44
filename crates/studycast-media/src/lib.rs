//! FFmpeg CLI wrapper for narration audio and captioned video rendering.
//!
//! This crate provides:
//! - FFmpeg command building and execution with timeouts and cancellation
//! - Media probing via ffprobe
//! - Lossless audio concatenation
//! - ASS/SRT caption documents
//! - Background + narration + captions compositing
//! - Atomic publishing of finished files

pub mod captions;
pub mod command;
pub mod compose;
pub mod concat;
pub mod error;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use captions::{build_ass, build_srt, CaptionStyle};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compose::{render_composite, ComposeJob};
pub use concat::concat_audio;
pub use error::{MediaError, MediaResult};
pub use fs_utils::{publish_atomically, staging_path_for, write_atomically, StagingFile};
pub use probe::{get_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
