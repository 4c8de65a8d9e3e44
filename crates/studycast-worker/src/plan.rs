//! Learning plan generation.

use tracing::info;

use studycast_ai::{DocumentAnalyzer, TextGenerator};
use studycast_models::LearningPlan;

use crate::analysis::analyze_project;
use crate::config::PipelineConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::pipeline::script::generate_with_retry;
use crate::project::ProjectStore;
use crate::prompts::plan_prompt;

/// Outcome of a plan request.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: LearningPlan,
    /// False when an existing plan was returned unchanged
    pub generated: bool,
}

/// Return the project's plan, generating it from the extracted analysis
/// when none exists yet. A project without an analysis has its uploaded
/// documents analysed first.
pub async fn ensure_plan(
    generator: &dyn TextGenerator,
    analyzer: Option<&dyn DocumentAnalyzer>,
    config: &PipelineConfig,
    store: &ProjectStore,
    user_id: &str,
    project_id: &str,
) -> WorkerResult<PlanOutcome> {
    if let Some(plan) = store.read_plan(user_id, project_id).await? {
        return Ok(PlanOutcome {
            plan,
            generated: false,
        });
    }

    let mut analysis = store.read_background_notes(user_id, project_id).await?;
    if analysis.trim().is_empty() {
        analysis = analyze_project(analyzer, config, store, user_id, project_id)
            .await?
            .text;
    }

    let text = generate_with_retry(
        generator,
        &plan_prompt(&analysis),
        config.text_gen_timeout,
        &config.text_gen_retry,
        "plan",
    )
    .await?;
    let plan = LearningPlan::from_model_output(&text)
        .map_err(|e| WorkerError::invalid_model_output(format!("plan: {}", e)))?;

    let path = store.write_plan(user_id, project_id, &plan).await?;
    info!(
        user_id,
        project_id,
        chapters = plan.chapters.len(),
        path = %path.display(),
        "Generated learning plan"
    );
    Ok(PlanOutcome {
        plan,
        generated: true,
    })
}
