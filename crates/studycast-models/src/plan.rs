//! Learning plan: chapters and their subtopics.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::json::extract_json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtopic {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub subtopics: Vec<Subtopic>,
}

/// Structured plan generated from the analysed project documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningPlan {
    pub chapters: Vec<Chapter>,
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("plan has no chapters")]
    NoChapters,

    #[error("chapter {0} has an empty title")]
    UntitledChapter(usize),
}

impl LearningPlan {
    /// Parse a plan from raw model output (optionally fenced).
    pub fn from_model_output(text: &str) -> Result<Self, PlanError> {
        let plan: LearningPlan = serde_json::from_str(extract_json(text))?;
        plan.validate()?;
        Ok(plan)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if self.chapters.is_empty() {
            return Err(PlanError::NoChapters);
        }
        if let Some(idx) = self.chapters.iter().position(|c| c.title.trim().is_empty()) {
            return Err(PlanError::UntitledChapter(idx));
        }
        Ok(())
    }

    pub fn subtopic(&self, chapter_idx: usize, sub_idx: usize) -> Option<&Subtopic> {
        self.chapters.get(chapter_idx)?.subtopics.get(sub_idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"```json
{"chapters": [
  {"title": "Grundlagen", "summary": "Basics", "subtopics": [
    {"title": "Zellen", "description": "Aufbau der Zelle"},
    {"title": "DNA", "description": "Erbinformation"}
  ]}
]}
```"#;

    #[test]
    fn test_parse_fenced_plan() {
        let plan = LearningPlan::from_model_output(PLAN).unwrap();
        assert_eq!(plan.chapters.len(), 1);
        assert_eq!(plan.subtopic(0, 1).unwrap().title, "DNA");
        assert!(plan.subtopic(0, 2).is_none());
        assert!(plan.subtopic(1, 0).is_none());
    }

    #[test]
    fn test_empty_plan_rejected() {
        assert!(matches!(
            LearningPlan::from_model_output(r#"{"chapters": []}"#),
            Err(PlanError::NoChapters)
        ));
        assert!(matches!(
            LearningPlan::from_model_output("not json"),
            Err(PlanError::Json(_))
        ));
    }
}
