// src/integrations/firebase/storage.rs
//
// Firebase Storage blob store over the v0 REST API.
//
// Uploads use the simple media endpoint. Download URLs are the public
// `alt=media` links gated by the object's first download token.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Deserialize;

use super::{ensure_success, FirebaseSettings};
use crate::error::{AppError, AppResult};
use crate::repositories::BlobStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMetadata {
    name: String,
    download_tokens: Option<String>,
}

pub struct FirebaseStorageBlobStore {
    client: Client,
    root: Url,
    bucket: String,
}

impl FirebaseStorageBlobStore {
    pub fn new(settings: &FirebaseSettings) -> AppResult<Self> {
        let root = Url::parse(&settings.storage_root).map_err(|e| {
            AppError::Config(format!(
                "Invalid Storage root '{}': {}",
                settings.storage_root, e
            ))
        })?;

        Ok(Self {
            client: settings.http_client()?,
            root,
            bucket: settings.storage_bucket.clone(),
        })
    }

    /// `{root}b/{bucket}/o[/{key}]`; the key is a single escaped segment.
    fn object_url(&self, key: Option<&str>) -> AppResult<Url> {
        let mut url = self.root.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| AppError::Config(format!("Storage root cannot be a base: {}", self.root)))?;
            segments
                .pop_if_empty()
                .extend(["b", self.bucket.as_str(), "o"]);
            if let Some(key) = key {
                segments.push(key);
            }
        }
        Ok(url)
    }

    async fn metadata(&self, key: &str) -> AppResult<ObjectMetadata> {
        let response = self.client.get(self.object_url(Some(key))?).send().await?;
        let metadata = ensure_success(response, key).await?.json().await?;
        Ok(metadata)
    }
}

#[async_trait]
impl BlobStore for FirebaseStorageBlobStore {
    fn name(&self) -> &'static str {
        "firebase-storage"
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        let size = bytes.len();
        let mut url = self.object_url(None)?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", key);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        let stored: ObjectMetadata = ensure_success(response, key).await?.json().await?;

        log::info!("Uploaded {} ({} bytes) to bucket {}", stored.name, size, self.bucket);
        Ok(())
    }

    async fn download_url(&self, key: &str) -> AppResult<String> {
        let metadata = self.metadata(key).await?;

        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').next())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Other(format!("Object {} has no download token", key)))?;

        let mut url = self.object_url(Some(key))?;
        url.query_pairs_mut()
            .append_pair("alt", "media")
            .append_pair("token", token);
        Ok(url.to_string())
    }
}
