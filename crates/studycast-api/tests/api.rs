use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use studycast_ai::{
    AiResult, DocumentAnalyzer, SourceDocument, SpeechSynthesizer, SynthesizedAudio, TextGenerator, Transcriber,
};
use studycast_api::{create_router, ApiConfig, AppState};
use studycast_media::{ComposeJob, MediaInfo};
use studycast_models::TranscriptSegment;
use studycast_worker::{Capabilities, GenerationService, MediaBackend, WorkerConfig, WorkerResult};

const PLAN: &str = r#"{"chapters": [{"title": "Zellbiologie", "subtopics": [
  {"title": "Mitochondrien", "description": "Kraftwerke der Zelle"}
]}]}"#;

struct FixedText(&'static str);

#[async_trait]
impl TextGenerator for FixedText {
    async fn generate(&self, _prompt: &str) -> AiResult<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[async_trait]
impl DocumentAnalyzer for FixedText {
    async fn analyze_documents(&self, _prompt: &str, _documents: &[SourceDocument]) -> AiResult<String> {
        Ok(self.0.to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct Silence;

#[async_trait]
impl SpeechSynthesizer for Silence {
    async fn synthesize(&self, text: &str, _voice: &str) -> AiResult<SynthesizedAudio> {
        Ok(SynthesizedAudio {
            bytes: text.as_bytes().to_vec(),
            extension: "mp3",
        })
    }

    fn name(&self) -> &str {
        "silence"
    }
}

#[async_trait]
impl Transcriber for Silence {
    async fn transcribe(&self, _audio: &Path) -> AiResult<Vec<TranscriptSegment>> {
        Ok(vec![TranscriptSegment::new(0.0, 5.0, "Hello there")])
    }

    fn name(&self) -> &str {
        "silence"
    }
}

/// Never finishes an encode, so video jobs stay in flight.
struct StuckEncoder;

#[async_trait]
impl MediaBackend for StuckEncoder {
    async fn probe_duration(&self, path: &Path) -> WorkerResult<f64> {
        Ok(tokio::fs::read(path).await?.len() as f64)
    }

    async fn probe_video(&self, _path: &Path) -> WorkerResult<MediaInfo> {
        Ok(MediaInfo {
            duration: 600.0,
            has_video: true,
            has_audio: false,
            width: 1080,
            height: 1920,
        })
    }

    async fn concat_audio(&self, clips: &[PathBuf], output: &Path) -> WorkerResult<()> {
        let mut joined = Vec::new();
        for clip in clips {
            joined.extend(tokio::fs::read(clip).await?);
        }
        tokio::fs::write(output, joined).await?;
        Ok(())
    }

    async fn render(&self, _job: &ComposeJob) -> WorkerResult<()> {
        std::future::pending().await
    }
}

struct TestApp {
    uploads: TempDir,
    _work: TempDir,
    router: Router,
}

impl TestApp {
    fn new(text: &'static str) -> Self {
        let uploads = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let caps = Capabilities {
            script_text: Arc::new(FixedText("Tom: Hello.\nLisa: Hi there.")),
            text: Arc::new(FixedText(text)),
            analyzer: Some(Arc::new(FixedText("Zellatmung und Mitochondrien"))),
            speech: Arc::new(Silence),
            transcriber: Arc::new(Silence),
            media: Arc::new(StuckEncoder),
        };
        let worker = WorkerConfig {
            uploads_root: uploads.path().to_path_buf(),
            work_dir: work.path().to_path_buf(),
            ..WorkerConfig::default()
        };
        let service = GenerationService::new(worker, caps);
        let router = create_router(AppState::with_service(ApiConfig::default(), service), None);
        Self {
            uploads,
            _work: work,
            router,
        }
    }

    async fn call(&self, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header("X-User-Id", user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn wait_for_state(&self, job_id: &str, user: &str, state: &str) -> Value {
        for _ in 0..500 {
            let (_, job) = self.call(Method::GET, &format!("/api/jobs/{}", job_id), Some(user), None).await;
            if job["state"] == state {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached {}", job_id, state);
    }
}

#[tokio::test]
async fn health_and_security_headers() {
    let app = TestApp::new("");
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn requests_without_caller_are_rejected() {
    let app = TestApp::new("");
    let (status, body) = app
        .call(
            Method::GET,
            "/api/projects/3/resources/status?type=video&chapter_idx=0&sub_idx=0",
            None,
            None,
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");
}

#[tokio::test]
async fn unknown_type_and_bad_project_are_bad_requests() {
    let app = TestApp::new("");
    let (status, body) = app
        .call(
            Method::POST,
            "/api/projects/3/resources",
            Some("7"),
            Some(json!({"type": "podcast", "chapter_idx": 0, "sub_idx": 0, "title": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["retryable"], false);

    let (status, _) = app
        .call(
            Method::POST,
            "/api/projects/p.q/resources",
            Some("7"),
            Some(json!({"type": "notes", "chapter_idx": 0, "sub_idx": 0, "title": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_video_request_conflicts_until_cancelled() {
    let app = TestApp::new("");
    let body = json!({"type": "video", "chapter_idx": 0, "sub_idx": 0, "title": "Zellatmung"});

    let (status, accepted) = app
        .call(Method::POST, "/api/projects/3/resources", Some("7"), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(accepted["url"], "/uploads/user_7/project_3/videos/0_0.mp4");
    let job_id = accepted["job_id"].as_str().unwrap().to_string();
    assert_eq!(accepted["status_url"], format!("/api/jobs/{}", job_id));

    let (status, conflict) = app
        .call(Method::POST, "/api/projects/3/resources", Some("7"), Some(body.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["code"], "already_in_progress");

    // Other users cannot see or cancel the job
    let (status, _) = app
        .call(Method::DELETE, &format!("/api/jobs/{}", job_id), Some("8"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/jobs/{}", job_id), Some("7"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    app.wait_for_state(&job_id, "7", "cancelled").await;

    let (status, _) = app
        .call(Method::POST, "/api/projects/3/resources", Some("7"), Some(body))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED);
}

#[tokio::test]
async fn status_reports_artifact_after_completion() {
    let app = TestApp::new("# Zellatmung\n\n- Glykolyse");
    let status_uri = "/api/projects/3/resources/status?type=notes&chapter_idx=1&sub_idx=2";

    let (status, before) = app.call(Method::GET, status_uri, Some("7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(before["exists"], false);
    assert!(before.get("job").is_none());

    let (_, accepted) = app
        .call(
            Method::POST,
            "/api/projects/3/resources",
            Some("7"),
            Some(json!({"type": "notes", "chapter_idx": 1, "sub_idx": 2, "title": "Zellatmung"})),
        )
        .await;
    let job_id = accepted["job_id"].as_str().unwrap().to_string();
    app.wait_for_state(&job_id, "7", "completed").await;

    let (_, after) = app.call(Method::GET, status_uri, Some("7"), None).await;
    assert_eq!(after["exists"], true);
    assert_eq!(after["url"], "/uploads/user_7/project_3/notes/1_2.md");
    assert_eq!(after["job"]["id"], job_id.as_str());
    assert!(app.uploads.path().join("user_7/project_3/notes/1_2.md").is_file());
}

#[tokio::test]
async fn plan_is_created_then_returned() {
    let app = TestApp::new(PLAN);

    let (status, body) = app.call(Method::POST, "/api/projects/3/plan", Some("7"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let extracted = app.uploads.path().join("user_7/project_3/extracted");
    std::fs::create_dir_all(&extracted).unwrap();
    std::fs::write(extracted.join("analysis.txt"), "Zellatmung und Mitochondrien").unwrap();

    let (status, body) = app.call(Method::POST, "/api/projects/3/plan", Some("7"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["plan"]["chapters"][0]["subtopics"][0]["title"], "Mitochondrien");

    let (status, body) = app.call(Method::POST, "/api/projects/3/plan", Some("7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generated"], false);
}

#[tokio::test]
async fn analysis_reads_uploaded_documents() {
    let app = TestApp::new(PLAN);

    let (status, body) = app.call(Method::POST, "/api/projects/3/analysis", Some("7"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");

    let project = app.uploads.path().join("user_7/project_3");
    std::fs::create_dir_all(&project).unwrap();
    std::fs::write(project.join("skript.pdf"), "%PDF-1.7").unwrap();
    std::fs::write(project.join("folien.pptx"), "pptx").unwrap();

    let (status, body) = app.call(Method::POST, "/api/projects/3/analysis", Some("7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["documents"], json!(["skript.pdf"]));
    assert_eq!(body["skipped"], json!(["folien.pptx"]));
    assert!(body.get("text").is_none());
    let notes = std::fs::read_to_string(project.join("extracted/analysis.txt")).unwrap();
    assert_eq!(notes, "Zellatmung und Mitochondrien");

    let (status, _) = app.call(Method::POST, "/api/projects/3/plan", Some("7"), None).await;
    assert_eq!(status, StatusCode::CREATED);
}
