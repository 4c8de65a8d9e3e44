//! Per-user project tree on disk.
//!
//! ```text
//! {uploads_root}/user_{u}/project_{p}/
//!     <uploaded documents>
//!     extracted/analysis.txt
//!     content/plan.json
//!     videos/{c}_{s}.mp4   (+ .srt sidecar)
//!     notes/{c}_{s}.md
//!     quizzes/{c}_{s}.json
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use studycast_media::write_atomically;
use studycast_models::{artifact, ArtifactKey, LearningPlan};

use crate::error::{WorkerError, WorkerResult};

/// Filesystem view of the uploads root.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn project_dir(&self, user_id: &str, project_id: &str) -> PathBuf {
        self.root.join(artifact::project_dir(user_id, project_id))
    }

    pub fn analysis_path(&self, user_id: &str, project_id: &str) -> PathBuf {
        self.project_dir(user_id, project_id)
            .join("extracted")
            .join("analysis.txt")
    }

    pub fn plan_path(&self, user_id: &str, project_id: &str) -> PathBuf {
        self.project_dir(user_id, project_id)
            .join("content")
            .join("plan.json")
    }

    pub fn artifact_path(&self, key: &ArtifactKey) -> PathBuf {
        key.path_under(&self.root)
    }

    /// Caption sidecar written next to a video.
    pub fn sidecar_path(&self, key: &ArtifactKey) -> PathBuf {
        self.artifact_path(key).with_extension("srt")
    }

    /// Whether the finished artifact is published.
    pub async fn artifact_exists(&self, key: &ArtifactKey) -> bool {
        tokio::fs::metadata(self.artifact_path(key))
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Extracted background notes; empty when the analysis has not run.
    pub async fn read_background_notes(&self, user_id: &str, project_id: &str) -> WorkerResult<String> {
        match tokio::fs::read_to_string(self.analysis_path(user_id, project_id)).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn write_analysis(&self, user_id: &str, project_id: &str, text: &str) -> WorkerResult<PathBuf> {
        let path = self.analysis_path(user_id, project_id);
        write_atomically(&path, text).await?;
        Ok(path)
    }

    /// Uploaded files at the top of the project directory, by name.
    ///
    /// Generated output lives in subdirectories and hidden staging files
    /// start with a dot; neither is listed.
    pub async fn list_documents(&self, user_id: &str, project_id: &str) -> WorkerResult<Vec<PathBuf>> {
        let mut entries = match tokio::fs::read_dir(self.project_dir(user_id, project_id)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if !hidden && entry.file_type().await?.is_file() {
                documents.push(entry.path());
            }
        }
        documents.sort();
        Ok(documents)
    }

    /// Stored learning plan, if one was generated.
    pub async fn read_plan(&self, user_id: &str, project_id: &str) -> WorkerResult<Option<LearningPlan>> {
        let raw = match tokio::fs::read_to_string(self.plan_path(user_id, project_id)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let plan: LearningPlan = serde_json::from_str(&raw)?;
        Ok(Some(plan))
    }

    pub async fn write_plan(&self, user_id: &str, project_id: &str, plan: &LearningPlan) -> WorkerResult<PathBuf> {
        let path = self.plan_path(user_id, project_id);
        let json = serde_json::to_vec_pretty(plan)?;
        write_atomically(&path, json).await?;
        Ok(path)
    }

    /// Title and description for a subtopic from the stored plan.
    pub async fn subtopic(
        &self,
        user_id: &str,
        project_id: &str,
        chapter_idx: usize,
        sub_idx: usize,
    ) -> WorkerResult<(String, String)> {
        let plan = self
            .read_plan(user_id, project_id)
            .await?
            .ok_or_else(|| WorkerError::not_found(format!("no plan for project {}", project_id)))?;
        let sub = plan.subtopic(chapter_idx, sub_idx).ok_or_else(|| {
            WorkerError::invalid_request(format!(
                "plan has no subtopic {}.{}",
                chapter_idx, sub_idx
            ))
        })?;
        Ok((sub.title.clone(), sub.description.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studycast_models::{ArtifactKind, Chapter, Subtopic};
    use tempfile::TempDir;

    fn plan() -> LearningPlan {
        LearningPlan {
            chapters: vec![Chapter {
                title: "Basics".into(),
                summary: "cells".into(),
                subtopics: vec![Subtopic {
                    title: "Membranes".into(),
                    description: "lipid bilayer".into(),
                }],
            }],
        }
    }

    #[tokio::test]
    async fn test_missing_analysis_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ProjectStore::new(dir.path());
        assert_eq!(store.read_background_notes("1", "2").await.unwrap(), "");
        assert!(store.read_plan("1", "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_plan_roundtrip_and_subtopic_lookup() {
        let dir = TempDir::new().unwrap();
        let store = ProjectStore::new(dir.path());

        let path = store.write_plan("1", "2", &plan()).await.unwrap();
        assert!(path.ends_with("user_1/project_2/content/plan.json"));

        let (title, description) = store.subtopic("1", "2", 0, 0).await.unwrap();
        assert_eq!(title, "Membranes");
        assert_eq!(description, "lipid bilayer");

        let err = store.subtopic("1", "2", 0, 5).await.unwrap_err();
        assert!(matches!(err, WorkerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_documents_exclude_generated_output() {
        let dir = TempDir::new().unwrap();
        let store = ProjectStore::new(dir.path());
        assert!(store.list_documents("1", "2").await.unwrap().is_empty());

        let project = store.project_dir("1", "2");
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(project.join("b_skript.pdf"), "%PDF-").unwrap();
        std::fs::write(project.join("a_tafel.png"), "png").unwrap();
        std::fs::write(project.join(".a_tafel.123.partial.png"), "png").unwrap();
        store.write_analysis("1", "2", "analysis").await.unwrap();
        store.write_plan("1", "2", &plan()).await.unwrap();

        let names: Vec<String> = store
            .list_documents("1", "2")
            .await
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a_tafel.png", "b_skript.pdf"]);
        assert_eq!(store.read_background_notes("1", "2").await.unwrap(), "analysis");
    }

    #[tokio::test]
    async fn test_artifact_exists_only_for_files() {
        let dir = TempDir::new().unwrap();
        let store = ProjectStore::new(dir.path());
        let key = ArtifactKey::new("1", "2", 0, 1, ArtifactKind::Notes);

        assert!(!store.artifact_exists(&key).await);
        let path = store.artifact_path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "# Notes").unwrap();
        assert!(store.artifact_exists(&key).await);
        assert_eq!(store.sidecar_path(&key).extension().unwrap(), "srt");
    }
}
