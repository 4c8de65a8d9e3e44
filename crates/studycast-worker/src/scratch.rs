//! Per-request scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::WorkerResult;

/// Private working directory for one pipeline run.
///
/// Intermediate clips, the assembled track and caption files live here.
/// The directory and everything in it is removed on drop, including when
/// the run is cancelled or fails.
#[derive(Debug)]
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    /// Create a fresh directory under `parent`.
    pub fn create_in(parent: &Path, label: &str) -> WorkerResult<Self> {
        std::fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize_label(label)))
            .tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Path for the synthesized clip of one dialogue line.
    pub fn clip_path(&self, line_index: usize, extension: &str) -> PathBuf {
        self.join(format!("line_{:04}.{}", line_index, extension))
    }
}

fn sanitize_label(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scratch_removed_on_drop() {
        let parent = TempDir::new().unwrap();
        let scratch = ScratchDir::create_in(parent.path(), "u/p/video/0_1").unwrap();
        let path = scratch.path().to_path_buf();
        std::fs::write(scratch.clip_path(3, "mp3"), b"x").unwrap();

        assert!(path.starts_with(parent.path()));
        assert!(scratch.clip_path(3, "mp3").ends_with("line_0003.mp3"));
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_concurrent_scratch_dirs_are_distinct() {
        let parent = TempDir::new().unwrap();
        let a = ScratchDir::create_in(parent.path(), "same").unwrap();
        let b = ScratchDir::create_in(parent.path(), "same").unwrap();
        assert_ne!(a.path(), b.path());
    }
}
