//! Source documents sent inline to a multimodal model.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AiResult;

/// One uploaded file, read into memory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, mime_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type,
            bytes,
        }
    }
}

/// MIME type for a document the analyzer accepts, by extension.
pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        "txt" | "md" => Some("text/plain"),
        _ => None,
    }
}

/// Reads a set of documents and answers a prompt about them.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze_documents(&self, prompt: &str, documents: &[SourceDocument]) -> AiResult<String>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("scan.JPG")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("skript.pdf")), Some("application/pdf"));
        assert_eq!(mime_type_for(Path::new("notes.md")), Some("text/plain"));
        assert_eq!(mime_type_for(Path::new("slides.pptx")), None);
        assert_eq!(mime_type_for(Path::new("README")), None);
    }
}
