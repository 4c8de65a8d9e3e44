//! Dialogue script generation and the shared text-generation call.

use std::time::{Duration, Instant};

use tracing::{debug, info};

use studycast_ai::TextGenerator;
use studycast_models::GenerationRequest;

use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::prompts::ScriptPrompt;
use crate::retry::{retry_async, RetryConfig, RetryResult};

/// One text-generation call bounded by `timeout`.
pub async fn generate_once(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
) -> WorkerResult<String> {
    match tokio::time::timeout(timeout, generator.generate(prompt)).await {
        Ok(result) => result.map_err(WorkerError::from_generation),
        Err(_) => Err(WorkerError::Timeout {
            stage: "text_generation",
            secs: timeout.as_secs(),
        }),
    }
}

/// Text generation with backoff on retryable failures.
pub async fn generate_with_retry(
    generator: &dyn TextGenerator,
    prompt: &str,
    timeout: Duration,
    retry: &RetryConfig,
    purpose: &'static str,
) -> WorkerResult<String> {
    let started = Instant::now();
    let result = retry_async(
        retry,
        WorkerError::is_retryable,
        WorkerError::retry_after,
        || generate_once(generator, prompt, timeout),
    )
    .await;

    match result {
        RetryResult::Success(text) => {
            debug!(
                purpose,
                provider = generator.name(),
                chars = text.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Text generated"
            );
            Ok(text)
        }
        RetryResult::Failed { error, attempts } => {
            metrics::record_text_gen_retries(purpose, attempts.saturating_sub(1));
            Err(error)
        }
    }
}

/// Ask the model for a two-speaker dialogue about the subtopic, retrying
/// transient provider failures.
///
/// The result is not validated; parsing tolerates arbitrary text, and a
/// script with no usable lines is rejected later.
pub async fn write_script(
    generator: &dyn TextGenerator,
    config: &PipelineConfig,
    request: &GenerationRequest,
) -> WorkerResult<String> {
    let prompt = ScriptPrompt {
        title: &request.subtopic_title,
        description: &request.subtopic_description,
        background_notes: &request.background_notes,
        voices: &config.voices,
        language: &config.script_language,
        word_target: config.script_word_target,
        chapters: config.script_chapters,
    }
    .render();

    let script = generate_with_retry(
        generator,
        &prompt,
        config.text_gen_timeout,
        &config.text_gen_retry,
        "script",
    )
    .await?;
    info!(
        provider = generator.name(),
        chars = script.len(),
        lines = script.lines().filter(|l| !l.trim().is_empty()).count(),
        "Script generated"
    );
    Ok(script)
}
