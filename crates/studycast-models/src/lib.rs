//! Shared data models for the StudyCast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Artifact keys and generation requests
//! - Dialogue lines and speaker voice tables
//! - Audio segments, transcripts and caption chunks
//! - Learning plans and quizzes
//! - Jobs and encoding configuration

pub mod artifact;
pub mod audio;
pub mod dialogue;
pub mod encoding;
pub mod job;
pub mod json;
pub mod plan;
pub mod quiz;
pub mod timestamp;
pub mod transcript;

// Re-export common types
pub use artifact::{ArtifactKey, ArtifactKind, GenerationRequest, RenderedArtifact, UnknownArtifactKind};
pub use audio::{AssembledTrack, AudioSegment};
pub use dialogue::{DialogueLine, VoiceProfile};
pub use encoding::EncodingConfig;
pub use job::{FailureKind, JobFailure, JobId, JobRecord, JobState};
pub use plan::{Chapter, LearningPlan, PlanError, Subtopic};
pub use quiz::{Quiz, QuizError, QuizQuestion};
pub use transcript::{CaptionChunk, TranscriptSegment};
