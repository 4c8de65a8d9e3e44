//! Timed transcript segments and the caption chunks derived from them.

use serde::{Deserialize, Serialize};

/// One timed span of recognized speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    pub text: String,
}

impl TranscriptSegment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// A short on-screen caption covering part of a transcript segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionChunk {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CaptionChunk {
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}
