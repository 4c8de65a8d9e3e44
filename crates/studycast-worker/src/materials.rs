//! Notes and quiz generation.

use std::path::Path;

use tracing::info;

use studycast_ai::TextGenerator;
use studycast_media::write_atomically;
use studycast_models::{GenerationRequest, Quiz, RenderedArtifact};

use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::script::generate_with_retry;
use crate::prompts::{notes_prompt, quiz_prompt};

/// Write a Markdown cheat sheet for the subtopic.
pub async fn generate_notes(
    generator: &dyn TextGenerator,
    config: &PipelineConfig,
    request: &GenerationRequest,
) -> WorkerResult<RenderedArtifact> {
    let prompt = notes_prompt(
        &request.subtopic_title,
        &request.subtopic_description,
        &request.background_notes,
    );
    let text = generate_with_retry(
        generator,
        &prompt,
        config.text_gen_timeout,
        &config.text_gen_retry,
        "notes",
    )
    .await?;

    let markdown = strip_markdown_fence(&text);
    if markdown.trim().is_empty() {
        return Err(WorkerError::invalid_model_output("notes response was empty"));
    }

    publish(&request.output_path, markdown.as_bytes()).await?;
    info!(path = %request.output_path.display(), chars = markdown.len(), "Published notes");
    Ok(RenderedArtifact {
        path: request.output_path.clone(),
        duration_secs: None,
        caption_count: 0,
    })
}

/// Write a multiple-choice quiz for the subtopic as `{"questions": [...]}`.
pub async fn generate_quiz(
    generator: &dyn TextGenerator,
    config: &PipelineConfig,
    request: &GenerationRequest,
) -> WorkerResult<RenderedArtifact> {
    let prompt = quiz_prompt(
        &request.subtopic_title,
        &request.subtopic_description,
        &request.background_notes,
    );
    let text = generate_with_retry(
        generator,
        &prompt,
        config.text_gen_timeout,
        &config.text_gen_retry,
        "quiz",
    )
    .await?;

    let quiz = Quiz::from_model_output(&text)
        .map_err(|e| WorkerError::invalid_model_output(format!("quiz: {}", e)))?;
    let json = serde_json::to_vec_pretty(&quiz)?;

    publish(&request.output_path, &json).await?;
    info!(
        path = %request.output_path.display(),
        questions = quiz.questions.len(),
        "Published quiz"
    );
    Ok(RenderedArtifact {
        path: request.output_path.clone(),
        duration_secs: None,
        caption_count: 0,
    })
}

async fn publish(path: &Path, contents: &[u8]) -> WorkerResult<()> {
    write_atomically(path, contents).await?;
    Ok(())
}

/// Models sometimes wrap the whole answer in a ```markdown fence.
fn strip_markdown_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => return trimmed.to_string(),
    };
    body.trim_end()
        .strip_suffix("```")
        .unwrap_or(body)
        .trim()
        .to_string()
}
