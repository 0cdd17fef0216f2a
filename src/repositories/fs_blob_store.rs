// src/repositories/fs_blob_store.rs
//
// Blob store on the local filesystem. Keys map to relative paths under the
// root directory; download URLs are `file://` URLs.

use async_trait::async_trait;
use reqwest::Url;
use std::path::{Component, Path, PathBuf};

use super::blob_store::BlobStore;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create the store, creating `root` if needed.
    pub fn new(root: impl AsRef<Path>) -> AppResult<Self> {
        std::fs::create_dir_all(root.as_ref())?;
        let root = root.as_ref().canonicalize()?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path under the root. Keys that would escape it
    /// are rejected.
    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if key.is_empty() || escapes {
            return Err(AppError::Other(format!("Invalid blob key '{}'", key)));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        log::debug!(
            "stored blob {} ({} bytes, {}) at {}",
            key,
            bytes.len(),
            content_type,
            path.display()
        );
        Ok(())
    }

    async fn download_url(&self, key: &str) -> AppResult<String> {
        let path = self.path_for(key)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(AppError::NotFound(format!("blob {}", key)));
        }

        Url::from_file_path(&path)
            .map(|url| url.to_string())
            .map_err(|_| AppError::Other(format!("Cannot build URL for {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_then_resolve_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("blobs")).unwrap();

        store
            .upload("movies/1700000000000_dune.jpg", vec![1, 2, 3], "image/jpeg")
            .await
            .unwrap();

        let url = store
            .download_url("movies/1700000000000_dune.jpg")
            .await
            .unwrap();
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("movies/1700000000000_dune.jpg"));

        let stored = std::fs::read(store.root().join("movies/1700000000000_dune.jpg")).unwrap();
        assert_eq!(stored, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();

        let err = store.download_url("movies/none.jpg").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_keys_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path()).unwrap();

        assert!(store.upload("../evil", vec![0], "text/plain").await.is_err());
        assert!(store.upload("/abs", vec![0], "text/plain").await.is_err());
    }
}
