//! Document analysis: uploaded files in, `extracted/analysis.txt` out.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use studycast_ai::text::mime_type_for;
use studycast_ai::{DocumentAnalyzer, SourceDocument};

use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::project::ProjectStore;
use crate::prompts::ANALYSIS_PROMPT;
use crate::retry::{retry_async, RetryResult};

/// Result of analysing a project's documents.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    /// Files sent to the model
    pub documents: Vec<String>,
    /// Files left out: unsupported type or over the size budget
    pub skipped: Vec<String>,
    #[serde(skip)]
    pub text: String,
    pub chars: usize,
}

/// Analyse every supported document in the project and store the result as
/// the project's background notes, replacing any earlier analysis.
pub async fn analyze_project(
    analyzer: Option<&dyn DocumentAnalyzer>,
    config: &PipelineConfig,
    store: &ProjectStore,
    user_id: &str,
    project_id: &str,
) -> WorkerResult<AnalysisOutcome> {
    let mut documents = Vec::new();
    let mut skipped = Vec::new();
    let mut total_bytes = 0u64;

    for path in store.list_documents(user_id, project_id).await? {
        let name = file_name(&path);
        let Some(mime_type) = mime_type_for(&path) else {
            skipped.push(name);
            continue;
        };
        let size = tokio::fs::metadata(&path).await?.len();
        if total_bytes + size > config.analysis_max_bytes {
            warn!(document = %name, size, limit = config.analysis_max_bytes, "Document over analysis size budget");
            skipped.push(name);
            continue;
        }
        total_bytes += size;
        documents.push(SourceDocument::new(name, mime_type, tokio::fs::read(&path).await?));
    }

    if documents.is_empty() {
        return Err(WorkerError::invalid_request(
            "project has no supported documents to analyze",
        ));
    }
    let analyzer = analyzer.ok_or_else(|| {
        WorkerError::config_error("document analysis needs GEMINI_API_KEY")
    })?;

    let started = Instant::now();
    let result = retry_async(
        &config.text_gen_retry,
        WorkerError::is_retryable,
        WorkerError::retry_after,
        || analyze_once(analyzer, &documents, config.analysis_timeout),
    )
    .await;
    let text = match result {
        RetryResult::Success(text) => text,
        RetryResult::Failed { error, attempts } => {
            metrics::record_text_gen_retries("analysis", attempts.saturating_sub(1));
            return Err(error);
        }
    };
    metrics::record_stage_duration("analysis", started.elapsed().as_secs_f64());

    let path = store.write_analysis(user_id, project_id, &text).await?;
    info!(
        user_id,
        project_id,
        documents = documents.len(),
        skipped = skipped.len(),
        bytes = total_bytes,
        chars = text.len(),
        path = %path.display(),
        "Analysed project documents"
    );

    Ok(AnalysisOutcome {
        documents: documents.into_iter().map(|d| d.name).collect(),
        skipped,
        chars: text.chars().count(),
        text,
    })
}

async fn analyze_once(
    analyzer: &dyn DocumentAnalyzer,
    documents: &[SourceDocument],
    timeout: Duration,
) -> WorkerResult<String> {
    let text = match tokio::time::timeout(timeout, analyzer.analyze_documents(ANALYSIS_PROMPT, documents)).await {
        Ok(result) => result.map_err(WorkerError::from_generation)?,
        Err(_) => {
            return Err(WorkerError::Timeout {
                stage: "analysis",
                secs: timeout.as_secs(),
            })
        }
    };
    if text.trim().is_empty() {
        return Err(WorkerError::invalid_model_output("analysis is empty"));
    }
    Ok(text)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
