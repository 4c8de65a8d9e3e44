//! Artifact identity and generation requests.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Kind of derived artifact produced for a subtopic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Narrated podcast-style video with captions
    Video,
    /// Markdown cheat-sheet
    Notes,
    /// Multiple-choice quiz as JSON
    Quiz,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "video",
            ArtifactKind::Notes => "notes",
            ArtifactKind::Quiz => "quiz",
        }
    }

    /// Project subfolder holding artifacts of this kind.
    pub fn folder(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "videos",
            ArtifactKind::Notes => "notes",
            ArtifactKind::Quiz => "quizzes",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Video => "mp4",
            ArtifactKind::Notes => "md",
            ArtifactKind::Quiz => "json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown artifact kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artifact type: {0}")]
pub struct UnknownArtifactKind(pub String);

impl FromStr for ArtifactKind {
    type Err = UnknownArtifactKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" => Ok(ArtifactKind::Video),
            "notes" => Ok(ArtifactKind::Notes),
            "quiz" => Ok(ArtifactKind::Quiz),
            other => Err(UnknownArtifactKind(other.to_string())),
        }
    }
}

/// Identity of one subtopic artifact.
///
/// Doubles as the request-deduplication key: at most one generation per key
/// may be in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    pub user_id: String,
    pub project_id: String,
    pub chapter_idx: usize,
    pub sub_idx: usize,
    pub kind: ArtifactKind,
}

impl ArtifactKey {
    pub fn new(
        user_id: impl Into<String>,
        project_id: impl Into<String>,
        chapter_idx: usize,
        sub_idx: usize,
        kind: ArtifactKind,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            project_id: project_id.into(),
            chapter_idx,
            sub_idx,
            kind,
        }
    }

    /// Project directory relative to the uploads root.
    pub fn project_dir(&self) -> PathBuf {
        project_dir(&self.user_id, &self.project_id)
    }

    /// Artifact path relative to the uploads root,
    /// e.g. `user_7/project_3/videos/0_2.mp4`.
    pub fn relative_path(&self) -> PathBuf {
        self.project_dir().join(self.kind.folder()).join(format!(
            "{}_{}.{}",
            self.chapter_idx,
            self.sub_idx,
            self.kind.extension()
        ))
    }

    /// Absolute artifact path under `root`.
    pub fn path_under(&self, root: &Path) -> PathBuf {
        root.join(self.relative_path())
    }

    /// Public URL path under which the artifact is served.
    pub fn url(&self) -> String {
        format!(
            "/uploads/{}",
            self.relative_path().to_string_lossy().replace('\\', "/")
        )
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}_{}",
            self.user_id, self.project_id, self.kind, self.chapter_idx, self.sub_idx
        )
    }
}

/// Project directory for a user and project, relative to the uploads root.
pub fn project_dir(user_id: &str, project_id: &str) -> PathBuf {
    PathBuf::from(format!("user_{}", user_id)).join(format!("project_{}", project_id))
}

/// Inputs for one subtopic artifact generation.
///
/// Immutable once built; consumed by a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Subtopic title
    pub subtopic_title: String,
    /// Subtopic description
    pub subtopic_description: String,
    /// Free-form notes extracted from the uploaded documents (may be empty)
    #[serde(default)]
    pub background_notes: String,
    /// Final output file path
    pub output_path: PathBuf,
}

impl GenerationRequest {
    pub fn new(
        subtopic_title: impl Into<String>,
        subtopic_description: impl Into<String>,
        background_notes: impl Into<String>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            subtopic_title: subtopic_title.into(),
            subtopic_description: subtopic_description.into(),
            background_notes: background_notes.into(),
            output_path: output_path.into(),
        }
    }
}

/// A finished, published artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub path: PathBuf,
    /// Duration for media artifacts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    /// Number of caption overlays burned in
    #[serde(default)]
    pub caption_count: usize,
}
