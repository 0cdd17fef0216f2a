// src/repositories/blob_store.rs
//
// Blob store contract used for poster images.

use async_trait::async_trait;

use crate::error::AppResult;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Stores `bytes` under `key`, replacing any existing blob.
    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()>;

    /// Publicly resolvable URL for an uploaded blob.
    async fn download_url(&self, key: &str) -> AppResult<String>;
}
