//! Generation metrics.
//!
//! Recorded through the `metrics` facade; the API process installs the
//! Prometheus recorder and exposes them on `/metrics`.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "studycast_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "studycast_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "studycast_jobs_failed_total";
    pub const JOBS_CANCELLED_TOTAL: &str = "studycast_jobs_cancelled_total";
    pub const JOBS_RUNNING: &str = "studycast_jobs_running";

    pub const STAGE_DURATION_SECONDS: &str = "studycast_stage_duration_seconds";
    pub const LINES_SYNTHESIZED_TOTAL: &str = "studycast_lines_synthesized_total";
    pub const LINES_SKIPPED_TOTAL: &str = "studycast_lines_skipped_total";
    pub const CAPTIONS_RENDERED_TOTAL: &str = "studycast_captions_rendered_total";
    pub const TEXT_GEN_RETRIES_TOTAL: &str = "studycast_text_generation_retries_total";
}

pub fn record_job_submitted(kind: &str) {
    counter!(names::JOBS_SUBMITTED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub fn record_job_completed(kind: &str, duration_secs: f64) {
    counter!(names::JOBS_COMPLETED_TOTAL, "kind" => kind.to_string()).increment(1);
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => format!("job_{}", kind))
        .record(duration_secs);
}

pub fn record_job_failed(kind: &str, code: &str) {
    let labels = [("kind", kind.to_string()), ("code", code.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

pub fn record_job_cancelled(kind: &str) {
    counter!(names::JOBS_CANCELLED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub fn set_running_jobs(count: usize) {
    gauge!(names::JOBS_RUNNING).set(count as f64);
}

/// Record how long a pipeline stage took.
pub fn record_stage_duration(stage: &'static str, duration_secs: f64) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(duration_secs);
}

pub fn record_lines(synthesized: usize, skipped: usize) {
    counter!(names::LINES_SYNTHESIZED_TOTAL).increment(synthesized as u64);
    counter!(names::LINES_SKIPPED_TOTAL).increment(skipped as u64);
}

pub fn record_captions(count: usize) {
    counter!(names::CAPTIONS_RENDERED_TOTAL).increment(count as u64);
}

pub fn record_text_gen_retries(purpose: &'static str, retries: u32) {
    if retries > 0 {
        counter!(names::TEXT_GEN_RETRIES_TOTAL, "purpose" => purpose).increment(retries as u64);
    }
}
