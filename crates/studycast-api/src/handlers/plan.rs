//! Document analysis and learning plan handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use studycast_models::LearningPlan;
use studycast_worker::AnalysisOutcome;

use crate::caller::Caller;
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub generated: bool,
    pub plan: LearningPlan,
}

/// POST /api/projects/:project_id/analysis
///
/// Re-reads the uploaded documents and replaces the project's notes.
pub async fn analyze_documents(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    caller: Caller,
) -> ApiResult<Json<AnalysisOutcome>> {
    let outcome = state.service.analyze(&caller.user_id, &project_id).await?;
    Ok(Json(outcome))
}

/// POST /api/projects/:project_id/plan
///
/// Returns 201 when the plan was generated now and 200 when it already
/// existed.
pub async fn create_plan(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    caller: Caller,
) -> ApiResult<(StatusCode, Json<PlanResponse>)> {
    let outcome = state.service.ensure_plan(&caller.user_id, &project_id).await?;
    let status = if outcome.generated {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(PlanResponse {
            generated: outcome.generated,
            plan: outcome.plan,
        }),
    ))
}
