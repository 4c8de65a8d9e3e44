//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "studycast_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "studycast_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "studycast_http_requests_in_flight";
    pub const RESOURCE_CONFLICTS_TOTAL: &str = "studycast_resource_conflicts_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a resource request rejected because the artifact is in flight.
pub fn record_resource_conflict(kind: &str) {
    let labels = [("type", kind.to_string())];
    counter!(names::RESOURCE_CONFLICTS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    static UUID: OnceLock<Regex> = OnceLock::new();
    static PROJECT: OnceLock<Regex> = OnceLock::new();
    static UPLOAD: OnceLock<Regex> = OnceLock::new();

    let uuid = UUID.get_or_init(|| {
        Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
    });
    let project = PROJECT.get_or_init(|| Regex::new(r"/projects/[A-Za-z0-9_-]+").unwrap());
    let upload = UPLOAD.get_or_init(|| Regex::new(r"^/uploads/.*").unwrap());

    let path = uuid.replace_all(path, ":id");
    let path = project.replace_all(&path, "/projects/:project_id");
    let path = upload.replace_all(&path, "/uploads/:file");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
