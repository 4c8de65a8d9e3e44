//! Atomic publishing of finished files.
//!
//! Readers polling the final path must never observe a partially written
//! artifact, so everything is produced under a hidden staging name in the
//! destination directory and renamed into place.

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// Hidden staging path next to `dst`, keeping its extension so tools that
/// infer the container from the file name still work.
///
/// `videos/0_2.mp4` → `videos/.0_2.<uuid>.partial.mp4`
pub fn staging_path_for(dst: &Path) -> PathBuf {
    let stem = dst
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "artifact".to_string());
    let name = match dst.extension() {
        Some(ext) => format!(".{}.{}.partial.{}", stem, Uuid::new_v4(), ext.to_string_lossy()),
        None => format!(".{}.{}.partial", stem, Uuid::new_v4()),
    };
    dst.with_file_name(name)
}

/// A staging file that is removed on drop unless it was published.
///
/// Dropping a render future mid-encode must not leave partial files beside
/// the real artifacts.
#[derive(Debug)]
pub struct StagingFile {
    path: PathBuf,
    armed: bool,
}

impl StagingFile {
    pub fn for_destination(dst: &Path) -> Self {
        Self {
            path: staging_path_for(dst),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the staging file onto `dst`.
    pub async fn publish(mut self, dst: &Path) -> MediaResult<()> {
        publish_atomically(&self.path, dst).await?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for StagingFile {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Move `src` to `dst` atomically, handling cross-device moves.
///
/// A same-filesystem rename is attempted first. On EXDEV the file is copied
/// to a staging path beside `dst` and renamed from there.
pub async fn publish_atomically(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            tracing::debug!(
                "Cross-device rename detected, copying via staging file: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_and_delete(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// Write `contents` to `dst` so the file appears complete or not at all.
pub async fn write_atomically(dst: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> MediaResult<()> {
    let dst = dst.as_ref();
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).await?;
    }

    let staging = staging_path_for(dst);
    if let Err(e) = fs::write(&staging, contents).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    if let Err(e) = fs::rename(&staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    Ok(())
}

/// Check if an IO error is EXDEV (cross-device link).
fn is_cross_device_error(e: &std::io::Error) -> bool {
    // EXDEV is error code 18 on Linux/macOS
    e.raw_os_error() == Some(18)
}

async fn copy_and_delete(src: &Path, dst: &Path) -> MediaResult<()> {
    let staging = staging_path_for(dst);

    if let Err(e) = fs::copy(src, &staging).await {
        let _ = fs::remove_file(&staging).await;
        tracing::error!(
            "Failed to copy file during cross-device move: {} -> {}: {}",
            src.display(),
            staging.display(),
            e
        );
        return Err(e.into());
    }

    if let Err(e) = fs::rename(&staging, dst).await {
        let _ = fs::remove_file(&staging).await;
        tracing::error!(
            "Failed to rename staging file: {} -> {}: {}",
            staging.display(),
            dst.display(),
            e
        );
        return Err(e.into());
    }

    if let Err(e) = fs::remove_file(src).await {
        tracing::warn!(
            "Failed to remove source file after cross-device move: {}: {}",
            src.display(),
            e
        );
    }

    Ok(())
}
