//! Generation service: background jobs with deduplication and cancellation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{watch, Semaphore};
use tracing::{error, info, warn, Instrument};

use studycast_models::{
    ArtifactKey, ArtifactKind, GenerationRequest, JobId, JobRecord, JobState, RenderedArtifact,
};

use crate::analysis::{analyze_project, AnalysisOutcome};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::locks::{InFlightGuard, RequestLocks};
use crate::logging::JobLogger;
use crate::materials::{generate_notes, generate_quiz};
use crate::metrics;
use crate::pipeline::{Capabilities, VideoPipeline};
use crate::plan::{ensure_plan, PlanOutcome};
use crate::project::ProjectStore;

/// A request to generate one subtopic artifact.
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub user_id: String,
    pub project_id: String,
    pub kind: ArtifactKind,
    pub chapter_idx: usize,
    pub sub_idx: usize,
    /// Overrides the subtopic title from the stored plan
    pub title: Option<String>,
    /// Overrides the subtopic description from the stored plan
    pub description: Option<String>,
}

impl ResourceRequest {
    pub fn key(&self) -> ArtifactKey {
        ArtifactKey::new(
            &self.user_id,
            &self.project_id,
            self.chapter_idx,
            self.sub_idx,
            self.kind,
        )
    }
}

/// Answer to a status poll. Never starts a generation.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactStatus {
    pub exists: bool,
    pub url: String,
    /// Most recent job for this artifact, if any is still remembered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<JobRecord>,
}

struct JobEntry {
    record: JobRecord,
    cancel: watch::Sender<bool>,
}

struct Inner {
    config: WorkerConfig,
    caps: Capabilities,
    store: ProjectStore,
    pipeline: VideoPipeline,
    locks: RequestLocks,
    jobs: Mutex<HashMap<JobId, JobEntry>>,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
}

/// Runs artifact generations as background tasks.
///
/// Cheap to clone; all clones share the job registry.
#[derive(Clone)]
pub struct GenerationService {
    inner: Arc<Inner>,
}

impl GenerationService {
    /// Build the service and every configured provider.
    pub fn from_config(config: WorkerConfig) -> WorkerResult<Self> {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let caps = Capabilities::from_config(&config, shutdown_rx)?;
        Ok(Self::with_shutdown(config, caps, shutdown))
    }

    /// Build the service around existing capabilities.
    pub fn new(config: WorkerConfig, caps: Capabilities) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self::with_shutdown(config, caps, shutdown)
    }

    fn with_shutdown(config: WorkerConfig, caps: Capabilities, shutdown: watch::Sender<bool>) -> Self {
        let pipeline = VideoPipeline::new(caps.clone(), config.pipeline.clone(), &config.work_dir);
        let store = ProjectStore::new(&config.uploads_root);
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        info!(
            max_concurrent_jobs = config.max_concurrent_jobs,
            uploads_root = %config.uploads_root.display(),
            work_dir = %config.work_dir.display(),
            ?caps,
            "Generation service ready"
        );

        Self {
            inner: Arc::new(Inner {
                config,
                caps,
                store,
                pipeline,
                locks: RequestLocks::new(),
                jobs: Mutex::new(HashMap::new()),
                job_semaphore,
                shutdown,
            }),
        }
    }

    pub fn store(&self) -> &ProjectStore {
        &self.inner.store
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.inner.config
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Accept a generation and start it in the background.
    ///
    /// Fails with `AlreadyInProgress` while another generation for the same
    /// artifact is pending or running.
    pub async fn submit(&self, request: ResourceRequest) -> WorkerResult<JobRecord> {
        if self.is_shutting_down() {
            return Err(WorkerError::Cancelled);
        }
        validate_id("user_id", &request.user_id)?;
        validate_id("project_id", &request.project_id)?;

        let key = request.key();
        let guard = self.inner.locks.try_acquire(&key)?;

        let (title, description) = self.resolve_subtopic(&request).await?;
        let background_notes = self
            .inner
            .store
            .read_background_notes(&request.user_id, &request.project_id)
            .await?;
        let generation = GenerationRequest::new(
            title,
            description,
            background_notes,
            self.inner.store.artifact_path(&key),
        );

        let record = JobRecord::new(key);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        {
            let mut jobs = self.inner.jobs();
            jobs.insert(
                record.id.clone(),
                JobEntry {
                    record: record.clone(),
                    cancel: cancel_tx,
                },
            );
            prune_history(&mut jobs, self.inner.config.max_job_history);
        }
        metrics::record_job_submitted(record.key.kind.as_str());
        info!(job_id = %record.id, artifact = %record.key, "Generation accepted");

        let inner = Arc::clone(&self.inner);
        let logger = JobLogger::new(&record.id, record.key.kind.as_str(), &record.key);
        let span = logger.create_span();
        let job_id = record.id.clone();
        tokio::spawn(
            async move {
                inner.run_job(job_id, generation, logger, guard, cancel_rx).await;
            }
            .instrument(span),
        );

        Ok(record)
    }

    /// Whether an artifact exists, plus its latest job.
    pub async fn status(&self, key: &ArtifactKey) -> WorkerResult<ArtifactStatus> {
        validate_id("user_id", &key.user_id)?;
        validate_id("project_id", &key.project_id)?;
        let exists = self.inner.store.artifact_exists(key).await;
        let job = self
            .inner
            .jobs()
            .values()
            .filter(|e| &e.record.key == key)
            .max_by_key(|e| e.record.created_at)
            .map(|e| e.record.clone());

        Ok(ArtifactStatus {
            exists,
            url: key.url(),
            job,
        })
    }

    pub fn job(&self, job_id: &JobId) -> Option<JobRecord> {
        self.inner.jobs().get(job_id).map(|e| e.record.clone())
    }

    /// Request cancellation. Finished jobs are returned unchanged.
    pub fn cancel(&self, job_id: &JobId) -> WorkerResult<JobRecord> {
        let jobs = self.inner.jobs();
        let entry = jobs
            .get(job_id)
            .ok_or_else(|| WorkerError::not_found(format!("job {}", job_id)))?;
        if !entry.record.state.is_terminal() {
            info!(job_id = %job_id, "Cancellation requested");
            let _ = entry.cancel.send(true);
        }
        Ok(entry.record.clone())
    }

    /// Analyse the project's uploaded documents, replacing earlier notes.
    pub async fn analyze(&self, user_id: &str, project_id: &str) -> WorkerResult<AnalysisOutcome> {
        validate_id("user_id", user_id)?;
        validate_id("project_id", project_id)?;
        analyze_project(
            self.inner.caps.analyzer.as_deref(),
            &self.inner.config.pipeline,
            &self.inner.store,
            user_id,
            project_id,
        )
        .await
    }

    /// Return the project's learning plan, generating it on first use.
    pub async fn ensure_plan(&self, user_id: &str, project_id: &str) -> WorkerResult<PlanOutcome> {
        validate_id("user_id", user_id)?;
        validate_id("project_id", project_id)?;
        ensure_plan(
            self.inner.caps.text.as_ref(),
            self.inner.caps.analyzer.as_deref(),
            &self.inner.config.pipeline,
            &self.inner.store,
            user_id,
            project_id,
        )
        .await
    }

    /// Cancel every job and wait for them to wind down.
    pub async fn shutdown(&self) {
        let _ = self.inner.shutdown.send(true);
        let deadline = Instant::now() + self.inner.config.shutdown_timeout;

        while self.inner.active_jobs() > 0 {
            if Instant::now() >= deadline {
                warn!(
                    active = self.inner.active_jobs(),
                    "Shutdown timeout reached with jobs still active"
                );
                return;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        info!("Generation service stopped");
    }

    async fn resolve_subtopic(&self, request: &ResourceRequest) -> WorkerResult<(String, String)> {
        if let Some(title) = request.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            return Ok((
                title.to_string(),
                request.description.clone().unwrap_or_default(),
            ));
        }

        let (title, description) = self
            .inner
            .store
            .subtopic(
                &request.user_id,
                &request.project_id,
                request.chapter_idx,
                request.sub_idx,
            )
            .await?;
        Ok((title, request.description.clone().unwrap_or(description)))
    }
}

impl Inner {
    fn jobs(&self) -> MutexGuard<'_, HashMap<JobId, JobEntry>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn active_jobs(&self) -> usize {
        self.jobs()
            .values()
            .filter(|e| !e.record.state.is_terminal())
            .count()
    }

    fn running_jobs(&self) -> usize {
        self.jobs()
            .values()
            .filter(|e| e.record.state == JobState::Running)
            .count()
    }

    async fn run_job(
        &self,
        job_id: JobId,
        request: GenerationRequest,
        logger: JobLogger,
        guard: InFlightGuard,
        mut cancel_rx: watch::Receiver<bool>,
    ) {
        let kind = guard.key().kind;
        let mut shutdown_rx = self.shutdown.subscribe();

        let permit = tokio::select! {
            permit = Arc::clone(&self.job_semaphore).acquire_owned() => permit,
            _ = wait_for_signal(&mut cancel_rx) => {
                self.finish(&job_id, guard, Err(WorkerError::Cancelled), 0.0);
                return;
            }
            _ = wait_for_signal(&mut shutdown_rx) => {
                self.finish(&job_id, guard, Err(WorkerError::Cancelled), 0.0);
                return;
            }
        };
        let _permit = match permit {
            Ok(permit) => permit,
            Err(_) => {
                self.finish(&job_id, guard, Err(WorkerError::Cancelled), 0.0);
                return;
            }
        };

        self.mark_started(&job_id);
        let started = Instant::now();
        let timeout = self.config.job_timeout;

        let outcome = tokio::select! {
            result = tokio::time::timeout(timeout, self.execute(kind, &request, &logger)) => {
                result.unwrap_or(Err(WorkerError::Timeout { stage: "job", secs: timeout.as_secs() }))
            }
            _ = wait_for_signal(&mut cancel_rx) => Err(WorkerError::Cancelled),
            _ = wait_for_signal(&mut shutdown_rx) => Err(WorkerError::Cancelled),
        };

        if let Err(e) = &outcome {
            if !matches!(e, WorkerError::Cancelled) {
                logger.log_error(&e.to_string());
            }
        }
        self.finish(&job_id, guard, outcome.map(|_| ()), started.elapsed().as_secs_f64());
    }

    async fn execute(
        &self,
        kind: ArtifactKind,
        request: &GenerationRequest,
        logger: &JobLogger,
    ) -> WorkerResult<RenderedArtifact> {
        match kind {
            ArtifactKind::Video => self.pipeline.run(request, logger).await,
            ArtifactKind::Notes => {
                generate_notes(self.caps.text.as_ref(), &self.config.pipeline, request).await
            }
            ArtifactKind::Quiz => {
                generate_quiz(self.caps.text.as_ref(), &self.config.pipeline, request).await
            }
        }
    }

    fn mark_started(&self, job_id: &JobId) {
        if let Some(entry) = self.jobs().get_mut(job_id) {
            entry.record.start();
        }
        metrics::set_running_jobs(self.running_jobs());
    }

    /// Release the artifact lock, then publish the terminal state.
    fn finish(&self, job_id: &JobId, guard: InFlightGuard, outcome: WorkerResult<()>, elapsed_secs: f64) {
        let kind = guard.key().kind;
        drop(guard);
        {
            let mut jobs = self.jobs();
            let Some(entry) = jobs.get_mut(job_id) else {
                return;
            };
            match &outcome {
                Ok(()) => {
                    entry.record.complete();
                    metrics::record_job_completed(kind.as_str(), elapsed_secs);
                    info!(job_id = %job_id, elapsed_secs, "Generation completed");
                }
                Err(WorkerError::Cancelled) => {
                    entry.record.cancel();
                    metrics::record_job_cancelled(kind.as_str());
                    info!(job_id = %job_id, "Generation cancelled");
                }
                Err(e) => {
                    entry.record.fail(e.to_job_failure());
                    metrics::record_job_failed(kind.as_str(), e.code());
                    error!(
                        job_id = %job_id,
                        code = e.code(),
                        retryable = e.is_retryable(),
                        "Generation failed: {}", e
                    );
                }
            }
        }
        metrics::set_running_jobs(self.running_jobs());
    }
}

/// Resolves once `rx` reads true; never resolves if the sender is gone.
async fn wait_for_signal(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|v| *v).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Drop the oldest finished records beyond `limit`.
fn prune_history(jobs: &mut HashMap<JobId, JobEntry>, limit: usize) {
    if jobs.len() <= limit {
        return;
    }
    let mut finished: Vec<(JobId, chrono::DateTime<chrono::Utc>)> = jobs
        .iter()
        .filter(|(_, e)| e.record.state.is_terminal())
        .map(|(id, e)| (id.clone(), e.record.updated_at))
        .collect();
    finished.sort_by_key(|(_, at)| *at);

    let excess = jobs.len() - limit;
    for (id, _) in finished.into_iter().take(excess) {
        jobs.remove(&id);
    }
}

/// Ids become path components, so only a safe alphabet is accepted.
fn validate_id(field: &str, value: &str) -> WorkerResult<()> {
    let ok = !value.is_empty()
        && value.len() <= 64
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(WorkerError::invalid_request(format!(
            "{} must be 1-64 characters of [A-Za-z0-9_-]",
            field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("user_id", "42").is_ok());
        assert!(validate_id("user_id", "a-b_C").is_ok());
        assert!(validate_id("user_id", "").is_err());
        assert!(validate_id("user_id", "../etc").is_err());
        assert!(validate_id("user_id", "a/b").is_err());
    }

    #[test]
    fn test_prune_keeps_active_jobs() {
        let mut jobs = HashMap::new();
        for i in 0..4 {
            let mut record = JobRecord::new(ArtifactKey::new("u", "p", 0, i, ArtifactKind::Quiz));
            if i < 3 {
                record.complete();
            }
            let (cancel, _) = watch::channel(false);
            jobs.insert(record.id.clone(), JobEntry { record, cancel });
        }

        prune_history(&mut jobs, 1);
        assert_eq!(jobs.len(), 1);
        assert!(jobs.values().all(|e| e.record.state == JobState::Pending));
    }
}
