//! Structured job logging utilities.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use studycast_models::{ArtifactKey, JobId};

/// Install the global subscriber.
///
/// `LOG_FORMAT=json` selects JSON lines for production, otherwise coloured
/// human-readable output. `RUST_LOG` overrides the default directive.
pub fn init_tracing(default_directive: &str) {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

/// Job logger for structured logging with consistent formatting.
///
/// Every event carries the job ID, the operation and the artifact key so a
/// single request can be followed through the log.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
    artifact: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str, key: &ArtifactKey) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
            artifact: key.to_string(),
        }
    }

    /// Logger for one-shot runs that have no job record.
    pub fn detached(operation: &str, artifact: &str) -> Self {
        Self {
            job_id: "-".to_string(),
            operation: operation.to_string(),
            artifact: artifact.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            artifact = %self.artifact,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            artifact = %self.artifact,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            artifact = %self.artifact,
            "Job completed: {}", message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            operation = %self.operation,
            artifact = %self.artifact
        )
    }
}
