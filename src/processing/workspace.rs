//! Scratch directory receiving uploads before extraction.
//!
//! Each process works in its own session directory under the configured root, and each upload
//! gets a fresh subdirectory inside it. Concurrent uploads with the same file name never share a
//! path, and a second binary starting on the same root leaves the first one's files alone.

use super::{sanitize::sanitize_filename, types::ProcessingError};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory where uploaded bytes are written before their text is extracted.
#[derive(Debug, Clone)]
pub struct UploadWorkspace {
    root: PathBuf,
    session: PathBuf,
}

/// Upload written to the workspace, pending extraction.
#[derive(Debug)]
pub struct StagedUpload {
    dir: PathBuf,
    path: PathBuf,
}

impl StagedUpload {
    /// File holding the uploaded bytes, named after the sanitized upload name.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UploadWorkspace {
    /// Create `root` and wipe and recreate this process's session directory inside it.
    pub fn prepare(root: impl Into<PathBuf>) -> Result<Self, ProcessingError> {
        let root = root.into();
        let session = root.join(format!("session-{}", std::process::id()));
        if session.exists() {
            std::fs::remove_dir_all(&session)?;
        }
        std::fs::create_dir_all(&session)?;
        tracing::debug!(path = %session.display(), "Upload workspace prepared");
        Ok(Self { root, session })
    }

    /// Configured root shared by every process.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owned by this process.
    pub fn session(&self) -> &Path {
        &self.session
    }

    /// Write `bytes` to a unique directory under the sanitized base name of `filename`.
    pub async fn store(
        &self,
        filename: &str,
        bytes: &[u8],
    ) -> Result<StagedUpload, ProcessingError> {
        let name = sanitize_filename(filename)
            .ok_or_else(|| ProcessingError::InvalidInput(format!("invalid filename '{filename}'")))?;
        let dir = self.session.join(Uuid::new_v4().to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(name);
        if let Err(error) = tokio::fs::write(&path, bytes).await {
            let _ = tokio::fs::remove_dir_all(&dir).await;
            return Err(error.into());
        }
        Ok(StagedUpload { dir, path })
    }

    /// Remove a stored upload and its directory; missing files are ignored.
    pub async fn discard(&self, upload: StagedUpload) {
        if let Err(error) = tokio::fs::remove_dir_all(&upload.dir).await
            && error.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %upload.dir.display(), error = %error, "Failed to remove upload");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn prepare_wipes_only_this_process_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("uploads");
        let other_process = root.join("session-0");
        std::fs::create_dir_all(&other_process).expect("mkdir");
        std::fs::write(other_process.join("in-flight.txt"), b"busy").expect("write");

        let first = UploadWorkspace::prepare(&root).expect("prepare");
        std::fs::write(first.session().join("stale.txt"), b"old").expect("write");
        let second = UploadWorkspace::prepare(&root).expect("prepare again");

        assert_eq!(second.root(), root.as_path());
        assert!(second.session().exists());
        assert!(!second.session().join("stale.txt").exists());
        assert!(other_process.join("in-flight.txt").exists());
    }

    #[tokio::test]
    async fn store_uses_base_name_and_discard_removes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = UploadWorkspace::prepare(dir.path().join("up")).expect("prepare");

        let upload = workspace
            .store("../../escape/contract.txt", b"hello")
            .await
            .expect("store");
        let path = upload.path().to_path_buf();

        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("contract.txt"));
        assert!(path.starts_with(workspace.session()));
        assert_eq!(std::fs::read(&path).expect("read"), b"hello");
        workspace.discard(upload).await;
        assert!(!path.exists());
        assert!(!path.parent().expect("upload dir").exists());
    }

    #[tokio::test]
    async fn same_name_uploads_get_distinct_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = UploadWorkspace::prepare(dir.path().join("up")).expect("prepare");

        let first = workspace.store("lease.txt", b"first").await.expect("first");
        let second = workspace.store("lease.txt", b"second").await.expect("second");

        assert_ne!(first.path(), second.path());
        assert_eq!(std::fs::read(first.path()).expect("read"), b"first");
        workspace.discard(second).await;
        assert_eq!(std::fs::read(first.path()).expect("read"), b"first");
        workspace.discard(first).await;
    }

    #[tokio::test]
    async fn store_rejects_unusable_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = UploadWorkspace::prepare(dir.path().join("up")).expect("prepare");
        let error = workspace.store("..", b"x").await.expect_err("rejected");
        assert!(matches!(error, ProcessingError::InvalidInput(_)));
    }
}
