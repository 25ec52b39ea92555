//! Uploads kept on the local filesystem under a media root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use quill_core::ports::media::{is_safe_relative_path, sanitized_extension, upload_path};
use quill_core::ports::{MediaError, MediaKind, MediaStorage, StoredMedia};

pub struct LocalMediaStorage {
    root: PathBuf,
}

impl LocalMediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, MediaError> {
        if !is_safe_relative_path(relative) {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStorage for LocalMediaStorage {
    async fn store(
        &self,
        kind: MediaKind,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredMedia, MediaError> {
        let file_name = match sanitized_extension(original_name) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let relative = upload_path(kind, Utc::now(), &file_name);
        let target = self.resolve(&relative)?;

        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| MediaError::Io(format!("failed to create upload dir: {e}")))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| MediaError::Io(format!("write error: {e}")))?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(StoredMedia { path: relative })
    }

    async fn load(&self, path: &str) -> Result<Option<Vec<u8>>, MediaError> {
        let target = self.resolve(path)?;
        match tokio::fs::read(&target).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaError::Io(format!("read error: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root() -> PathBuf {
        std::env::temp_dir().join(format!("quill-media-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn stored_upload_can_be_loaded_back() {
        let root = scratch_root();
        let storage = LocalMediaStorage::new(&root);

        let stored = storage
            .store(MediaKind::File, "Report.PDF", b"%PDF-1.7")
            .await
            .unwrap();

        assert!(stored.path.starts_with("blog/files/"));
        assert!(stored.path.ends_with(".pdf"));
        assert_eq!(
            storage.load(&stored.path).await.unwrap(),
            Some(b"%PDF-1.7".to_vec())
        );

        let _ = tokio::fs::remove_dir_all(root).await;
    }

    #[tokio::test]
    async fn missing_upload_is_none() {
        let storage = LocalMediaStorage::new(scratch_root());
        assert_eq!(
            storage
                .load("blog/images/2024/01/01/nope.png")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn escaping_paths_are_rejected() {
        let storage = LocalMediaStorage::new(scratch_root());
        assert!(matches!(
            storage.load("../secrets.txt").await,
            Err(MediaError::InvalidPath(_))
        ));
    }
}
