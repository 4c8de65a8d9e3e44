//! Multiple-choice quizzes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::json::extract_json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub questions: Vec<QuizQuestion>,
}

#[derive(Debug, Error)]
pub enum QuizError {
    #[error("quiz is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("quiz has no questions")]
    Empty,

    #[error("question {index} is invalid: {reason}")]
    InvalidQuestion { index: usize, reason: String },
}

impl Quiz {
    /// Parse a quiz from raw model output.
    ///
    /// Accepts an optionally fenced object with either a `questions` or a
    /// `quiz` array, or a bare array of questions.
    pub fn from_model_output(text: &str) -> Result<Self, QuizError> {
        let value: Value = serde_json::from_str(extract_json(text))?;
        let questions = match value {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut map) => map
                .remove("questions")
                .or_else(|| map.remove("quiz"))
                .unwrap_or(Value::Array(Vec::new())),
            _ => Value::Array(Vec::new()),
        };
        let quiz = Quiz {
            questions: serde_json::from_value(questions)?,
        };
        quiz.validate()?;
        Ok(quiz)
    }

    pub fn validate(&self) -> Result<(), QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::Empty);
        }
        for (index, q) in self.questions.iter().enumerate() {
            let invalid = |reason: &str| QuizError::InvalidQuestion {
                index,
                reason: reason.to_string(),
            };
            if q.question.trim().is_empty() {
                return Err(invalid("empty question"));
            }
            if q.options.len() < 2 {
                return Err(invalid("fewer than two options"));
            }
            if q.answer.trim().is_empty() {
                return Err(invalid("empty answer"));
            }
        }
        Ok(())
    }
}
