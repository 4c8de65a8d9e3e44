//! Job inspection and cancellation.

use axum::extract::{Path, State};
use axum::Json;

use studycast_models::{JobId, JobRecord};

use crate::caller::Caller;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Jobs of other users are reported as missing.
fn owned_job(state: &AppState, caller: &Caller, job_id: &JobId) -> ApiResult<JobRecord> {
    state
        .service
        .job(job_id)
        .filter(|record| record.key.user_id == caller.user_id)
        .ok_or_else(|| ApiError::not_found(format!("job {}", job_id)))
}

/// GET /api/jobs/:job_id
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    caller: Caller,
) -> ApiResult<Json<JobRecord>> {
    let job_id = JobId::from_string(job_id);
    Ok(Json(owned_job(&state, &caller, &job_id)?))
}

/// DELETE /api/jobs/:job_id
///
/// Requests cancellation and returns the record as it stands; the job
/// reaches `cancelled` shortly after. Finished jobs are returned unchanged.
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    caller: Caller,
) -> ApiResult<Json<JobRecord>> {
    let job_id = JobId::from_string(job_id);
    owned_job(&state, &caller, &job_id)?;
    Ok(Json(state.service.cancel(&job_id)?))
}
