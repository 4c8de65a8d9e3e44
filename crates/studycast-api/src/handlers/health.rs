//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub service: CheckStatus,
    pub uploads: CheckStatus,
    pub background: CheckStatus,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            error: Some(msg.into()),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Checks that the service accepts work and its directories are in place.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let service = if state.service.is_shutting_down() {
        CheckStatus::error("shutting down")
    } else {
        CheckStatus::ok()
    };

    let uploads_root = state.service.store().root().to_path_buf();
    let uploads = match tokio::fs::metadata(&uploads_root).await {
        Ok(m) if m.is_dir() => CheckStatus::ok(),
        Ok(_) => CheckStatus::error(format!("{} is not a directory", uploads_root.display())),
        Err(e) => CheckStatus::error(format!("{}: {}", uploads_root.display(), e)),
    };

    let background_path = &state.service.config().pipeline.background_video;
    let background = match tokio::fs::metadata(background_path).await {
        Ok(m) if m.is_file() => CheckStatus::ok(),
        Ok(_) => CheckStatus::error(format!("{} is not a file", background_path.display())),
        Err(e) => CheckStatus::error(format!("{}: {}", background_path.display(), e)),
    };

    let all_ok = service.is_ok() && uploads.is_ok() && background.is_ok();
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            service,
            uploads,
            background,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
