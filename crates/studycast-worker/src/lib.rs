//! Study artifact generation.
//!
//! This crate turns a subtopic of a learning plan into derived artifacts:
//! - a narrated two-speaker video with burned-in captions
//! - a Markdown cheat-sheet
//! - a multiple-choice quiz
//!
//! It also analyses a project's uploaded documents into background notes,
//! generates the learning plan from them, and runs each artifact generation
//! as a cancellable background job with per-artifact deduplication.

pub mod analysis;
pub mod config;
pub mod error;
pub mod locks;
pub mod logging;
pub mod materials;
pub mod metrics;
pub mod pipeline;
pub mod plan;
pub mod project;
pub mod prompts;
pub mod retry;
pub mod scratch;
pub mod service;

pub use analysis::AnalysisOutcome;
pub use config::{BackgroundPolicy, PipelineConfig, SynthesisMode, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use locks::{InFlightGuard, RequestLocks};
pub use logging::JobLogger;
pub use pipeline::{Capabilities, FfmpegBackend, MediaBackend, VideoPipeline};
pub use project::ProjectStore;
pub use plan::PlanOutcome;
pub use service::{ArtifactStatus, GenerationService, ResourceRequest};
