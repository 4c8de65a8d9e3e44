//! Generation job bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::ArtifactKey;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a generation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, waiting for a worker slot
    #[default]
    Pending,
    /// Pipeline is running
    Running,
    /// Artifact published
    Completed,
    /// Pipeline failed; see the job failure
    Failed,
    /// Cancelled by the caller or by shutdown
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

/// Whether a failed request is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transient upstream problem; retrying later may succeed
    Retryable,
    /// The input can never produce an artifact as configured
    Unprocessable,
    /// Local fault (I/O, configuration, bug)
    Internal,
}

/// Structured failure recorded on a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    /// Stable machine-readable code, e.g. `no_dialogue_lines`
    pub code: String,
    pub message: String,
}

/// In-process record of one generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub key: ArtifactKey,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<JobFailure>,
}

impl JobRecord {
    pub fn new(key: ArtifactKey) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            key,
            state: JobState::Pending,
            created_at: now,
            updated_at: now,
            started_at: None,
            finished_at: None,
            failure: None,
        }
    }

    pub fn start(&mut self) {
        let now = Utc::now();
        self.state = JobState::Running;
        self.started_at = Some(now);
        self.updated_at = now;
    }

    pub fn complete(&mut self) {
        self.finish(JobState::Completed, None);
    }

    pub fn fail(&mut self, failure: JobFailure) {
        self.finish(JobState::Failed, Some(failure));
    }

    pub fn cancel(&mut self) {
        self.finish(JobState::Cancelled, None);
    }

    fn finish(&mut self, state: JobState, failure: Option<JobFailure>) {
        let now = Utc::now();
        self.state = state;
        self.failure = failure;
        self.finished_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArtifactKind;

    #[test]
    fn test_job_lifecycle() {
        let mut job = JobRecord::new(ArtifactKey::new("u", "p", 0, 0, ArtifactKind::Video));
        assert_eq!(job.state, JobState::Pending);
        assert!(!job.state.is_terminal());

        job.start();
        assert_eq!(job.state, JobState::Running);
        assert!(job.started_at.is_some());

        job.fail(JobFailure {
            kind: FailureKind::Unprocessable,
            code: "no_dialogue_lines".into(),
            message: "script contained no recognized lines".into(),
        });
        assert!(job.state.is_terminal());
        assert_eq!(job.failure.as_ref().unwrap().kind, FailureKind::Unprocessable);
    }

    #[test]
    fn test_state_serialization() {
        assert_eq!(
            serde_json::to_string(&JobState::Cancelled).unwrap(),
            "\"cancelled\""
        );
    }
}
