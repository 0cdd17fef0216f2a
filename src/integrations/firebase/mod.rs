// src/integrations/firebase/mod.rs
//
// Firebase REST adapters
//
// ARCHITECTURE:
// - Firestore v1 REST API backs `DocumentStore`
// - Firebase Storage v0 REST API backs `BlobStore`
// - Requests are unauthenticated apart from the project API key
// - HTTP 404 means NotFound only where one document is addressed; a 404 on a
//   collection, database or bucket is a Remote error like any other failure

pub mod firestore;
pub mod storage;
pub mod values;

pub use firestore::FirestoreDocumentStore;
pub use storage::FirebaseStorageBlobStore;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_FIRESTORE_ROOT: &str = "https://firestore.googleapis.com/v1/";
pub const DEFAULT_STORAGE_ROOT: &str = "https://firebasestorage.googleapis.com/v0/";

/// Connection settings for one Firebase project
#[derive(Debug, Clone, PartialEq)]
pub struct FirebaseSettings {
    pub project_id: String,
    pub api_key: String,
    pub storage_bucket: String,
    /// Firestore REST root, overridable for the emulator
    pub firestore_root: String,
    /// Storage REST root, overridable for the emulator
    pub storage_root: String,
    pub timeout: Duration,
}

impl FirebaseSettings {
    pub fn new(
        project_id: impl Into<String>,
        api_key: impl Into<String>,
        storage_bucket: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: api_key.into(),
            storage_bucket: storage_bucket.into(),
            firestore_root: DEFAULT_FIRESTORE_ROOT.to_string(),
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point both adapters at one local server (emulator or test fake).
    pub fn with_roots(mut self, firestore_root: &str, storage_root: &str) -> Self {
        self.firestore_root = firestore_root.to_string();
        self.storage_root = storage_root.to_string();
        self
    }

    /// Shared HTTP client honouring the configured timeout
    pub fn http_client(&self) -> AppResult<Client> {
        let client = Client::builder().timeout(self.timeout).build()?;
        Ok(client)
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Pass successful responses through; turn the rest into `Remote` errors.
/// `what` names the addressed resource in the log.
pub(crate) async fn ensure_success(response: Response, what: &str) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);

    log::warn!("Firebase request for {} failed with {}: {}", what, status, message);
    Err(AppError::Remote {
        status: status.as_u16(),
        message,
    })
}

/// Like `ensure_success`, for requests addressing one existing document:
/// a 404 there means the document is absent.
pub(crate) async fn ensure_found(response: Response, what: &str) -> AppResult<Response> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(what.to_string()));
    }
    ensure_success(response, what).await
}
