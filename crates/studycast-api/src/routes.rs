//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{
    analyze_documents, cancel_job, create_plan, create_resource, get_job, health, ready, resource_status,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let project_routes = Router::new()
        .route("/projects/:project_id/resources", post(create_resource))
        .route("/projects/:project_id/resources/status", get(resource_status));

    let job_routes = Router::new().route("/jobs/:job_id", get(get_job).delete(cancel_job));

    // These wait on the model inside the request
    let model_routes = Router::new()
        .route("/projects/:project_id/analysis", post(analyze_documents))
        .route("/projects/:project_id/plan", post(create_plan))
        .layer(TimeoutLayer::new(state.config.model_request_timeout));

    let api_routes = Router::new()
        .merge(project_routes)
        .merge(job_routes)
        .layer(TimeoutLayer::new(state.config.request_timeout))
        .merge(model_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let mut router = Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    if let Some(root) = &state.config.serve_uploads {
        router = router.nest_service("/uploads", ServeDir::new(root));
    }

    router
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
