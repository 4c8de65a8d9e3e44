//! Synthesized audio segments and the assembled narration track.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One synthesized dialogue line on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSegment {
    /// Index of the dialogue line this clip speaks
    pub line_index: usize,
    pub speaker: String,
    pub path: PathBuf,
    /// Probed clip duration in seconds
    pub duration_secs: f64,
}

/// The single narration track produced by concatenating all segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledTrack {
    pub path: PathBuf,
    /// Sum of the segment durations; authoritative for trimming the video
    pub duration_secs: f64,
    pub segment_count: usize,
}

impl AssembledTrack {
    /// Build a track whose duration is the exact sum of `segments`.
    pub fn from_segments(path: impl Into<PathBuf>, segments: &[AudioSegment]) -> Self {
        Self {
            path: path.into(),
            duration_secs: segments.iter().map(|s| s.duration_secs).sum(),
            segment_count: segments.len(),
        }
    }
}
