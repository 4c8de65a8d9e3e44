//! Text generation providers.

mod document;
mod gemini;
mod openai;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AiError, AiResult};

pub use document::{mime_type_for, DocumentAnalyzer, SourceDocument};
pub use gemini::{GeminiClient, GeminiConfig};
pub use openai::{OpenAiTextClient, OpenAiTextConfig};
pub(crate) use openai::DEFAULT_OPENAI_BASE_URL;

/// Prompt in, text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`.
    ///
    /// Fails with a retryable error ([`AiError::Unavailable`],
    /// [`AiError::RateLimited`], timeouts) when the provider cannot answer
    /// right now.
    async fn generate(&self, prompt: &str) -> AiResult<String>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

/// Which text provider to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextProvider {
    Gemini,
    OpenAi,
}

impl TextProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextProvider::Gemini => "gemini",
            TextProvider::OpenAi => "openai",
        }
    }

    /// Build the provider from its environment configuration.
    pub fn build_from_env(&self) -> AiResult<Arc<dyn TextGenerator>> {
        Ok(match self {
            TextProvider::Gemini => Arc::new(GeminiClient::new(GeminiConfig::from_env())?),
            TextProvider::OpenAi => Arc::new(OpenAiTextClient::new(OpenAiTextConfig::from_env())?),
        })
    }
}

impl fmt::Display for TextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TextProvider {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(TextProvider::Gemini),
            "openai" => Ok(TextProvider::OpenAi),
            other => Err(AiError::config(format!("unknown text provider '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parsing() {
        assert_eq!("Gemini".parse::<TextProvider>().unwrap(), TextProvider::Gemini);
        assert_eq!("openai".parse::<TextProvider>().unwrap(), TextProvider::OpenAi);
        assert!("claude".parse::<TextProvider>().is_err());
    }
}
