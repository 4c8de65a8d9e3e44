//! Subtopic resource handlers.
//!
//! `POST` starts a generation in the background and returns immediately;
//! clients poll the status endpoint, which never starts work itself.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use studycast_models::{ArtifactKey, ArtifactKind, JobState, UnknownArtifactKind};
use studycast_worker::{ArtifactStatus, ResourceRequest, WorkerError};

use crate::caller::Caller;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Body of a resource request.
#[derive(Debug, Deserialize)]
pub struct CreateResourceRequest {
    /// `video`, `notes` or `quiz`
    #[serde(rename = "type")]
    pub kind: String,
    pub chapter_idx: usize,
    pub sub_idx: usize,
    /// Defaults to the subtopic title from the project plan
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateResourceResponse {
    pub job_id: String,
    pub status: JobState,
    /// Where the artifact will be served once published
    pub url: String,
    pub status_url: String,
}

/// Query of a status poll.
#[derive(Debug, Deserialize)]
pub struct ResourceStatusQuery {
    #[serde(rename = "type")]
    pub kind: String,
    pub chapter_idx: usize,
    pub sub_idx: usize,
}

fn parse_kind(kind: &str) -> ApiResult<ArtifactKind> {
    kind.parse()
        .map_err(|e: UnknownArtifactKind| ApiError::bad_request(e.to_string()))
}

/// POST /api/projects/:project_id/resources
///
/// Returns:
/// - 202: generation accepted
/// - 400: unknown type, bad ids or no such subtopic in the plan
/// - 404: no plan and no explicit title
/// - 409: a generation for this artifact is already running
pub async fn create_resource(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    caller: Caller,
    Json(body): Json<CreateResourceRequest>,
) -> ApiResult<(StatusCode, Json<CreateResourceResponse>)> {
    let kind = parse_kind(&body.kind)?;
    let request = ResourceRequest {
        user_id: caller.user_id,
        project_id,
        kind,
        chapter_idx: body.chapter_idx,
        sub_idx: body.sub_idx,
        title: body.title,
        description: body.description,
    };

    let record = match state.service.submit(request).await {
        Ok(record) => record,
        Err(e @ WorkerError::AlreadyInProgress(_)) => {
            metrics::record_resource_conflict(kind.as_str());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    info!(job_id = %record.id, artifact = %record.key, "Resource generation started");
    Ok((
        StatusCode::ACCEPTED,
        Json(CreateResourceResponse {
            job_id: record.id.to_string(),
            status: record.state,
            url: record.key.url(),
            status_url: format!("/api/jobs/{}", record.id),
        }),
    ))
}

/// GET /api/projects/:project_id/resources/status
pub async fn resource_status(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Query(query): Query<ResourceStatusQuery>,
    caller: Caller,
) -> ApiResult<Json<ArtifactStatus>> {
    let key = ArtifactKey::new(
        caller.user_id,
        project_id,
        query.chapter_idx,
        query.sub_idx,
        parse_kind(&query.kind)?,
    );
    Ok(Json(state.service.status(&key).await?))
}
