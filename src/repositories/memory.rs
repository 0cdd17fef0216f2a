// src/repositories/memory.rs
//
// Process-local stores. They back the `memory` backend and the test suite,
// and journal every call so callers can assert on remote traffic.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use super::blob_store::BlobStore;
use super::document_store::{Document, DocumentStore, Fields};
use crate::error::{AppError, AppResult};

/// One call made against an in-memory store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List { collection: String },
    Get { collection: String, id: String },
    Add { collection: String },
    Overwrite { collection: String, id: String },
    Delete { collection: String, id: String },
    Upload { key: String },
    DownloadUrl { key: String },
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StoreCall::Add { .. } | StoreCall::Overwrite { .. } | StoreCall::Delete { .. }
        )
    }
}

/// Ordered log of store calls. Clones share the same log, so a document
/// store and a blob store can record into one sequence.
#[derive(Debug, Clone, Default)]
pub struct CallJournal {
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl CallJournal {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, call: StoreCall) {
        lock(&self.calls).push(call);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        lock(&self.calls).clone()
    }

    pub fn count(&self, predicate: impl Fn(&StoreCall) -> bool) -> usize {
        lock(&self.calls).iter().filter(|c| predicate(c)).count()
    }

    pub fn clear(&self) {
        lock(&self.calls).clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared failure injection and latency for the fake stores
#[derive(Debug, Default)]
struct Behaviour {
    failure: Option<String>,
    latency: Option<Duration>,
}

impl Behaviour {
    async fn apply(behaviour: &Mutex<Behaviour>) -> AppResult<()> {
        let (failure, latency) = {
            let b = lock(behaviour);
            (b.failure.clone(), b.latency)
        };
        if let Some(delay) = latency {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(message) => Err(AppError::Remote {
                status: 503,
                message,
            }),
            None => Ok(()),
        }
    }
}

// ============================================================================
// DOCUMENT STORE
// ============================================================================

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    /// collection -> documents in insertion order
    collections: Mutex<HashMap<String, Vec<Document>>>,
    journal: CallJournal,
    behaviour: Mutex<Behaviour>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: CallJournal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Delay every call, so concurrent callers overlap.
    pub fn with_latency(self, latency: Duration) -> Self {
        lock(&self.behaviour).latency = Some(latency);
        self
    }

    /// Make every following call fail with a remote error (`None` heals).
    pub fn set_failure(&self, message: Option<&str>) {
        lock(&self.behaviour).failure = message.map(str::to_string);
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    /// Insert a document directly, bypassing the journal (test fixtures).
    pub fn seed(&self, collection: &str, id: &str, fields: Fields) {
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id, fields));
    }

    /// Current fields of a document, bypassing the journal.
    pub fn peek(&self, collection: &str, id: &str) -> Option<Fields> {
        lock(&self.collections)
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.fields.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list(&self, collection: &str) -> AppResult<Vec<Document>> {
        self.journal.record(StoreCall::List {
            collection: collection.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        Ok(lock(&self.collections)
            .get(collection)
            .cloned()
            .unwrap_or_default())
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>> {
        self.journal.record(StoreCall::Get {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        Ok(lock(&self.collections)
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String> {
        self.journal.record(StoreCall::Add {
            collection: collection.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        let id = Uuid::new_v4().simple().to_string();
        lock(&self.collections)
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn overwrite(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()> {
        self.journal.record(StoreCall::Overwrite {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        let mut collections = lock(&self.collections);
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| AppError::NotFound(format!("{}/{}", collection, id)))?;

        doc.fields.extend(fields);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        self.journal.record(StoreCall::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        if let Some(docs) = lock(&self.collections).get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }
}

// ============================================================================
// BLOB STORE
// ============================================================================

#[derive(Debug)]
pub struct InMemoryBlobStore {
    base_url: String,
    blobs: Mutex<HashMap<String, (Vec<u8>, String)>>,
    journal: CallJournal,
    behaviour: Mutex<Behaviour>,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new("memory://blobs")
    }
}

impl InMemoryBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            blobs: Mutex::new(HashMap::new()),
            journal: CallJournal::new(),
            behaviour: Mutex::new(Behaviour::default()),
        }
    }

    pub fn with_journal(journal: CallJournal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub fn set_failure(&self, message: Option<&str>) {
        lock(&self.behaviour).failure = message.map(str::to_string);
    }

    pub fn journal(&self) -> &CallJournal {
        &self.journal
    }

    pub fn contains(&self, key: &str) -> bool {
        lock(&self.blobs).contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.blobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upload(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<()> {
        self.journal.record(StoreCall::Upload {
            key: key.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        lock(&self.blobs).insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn download_url(&self, key: &str) -> AppResult<String> {
        self.journal.record(StoreCall::DownloadUrl {
            key: key.to_string(),
        });
        Behaviour::apply(&self.behaviour).await?;

        if !lock(&self.blobs).contains_key(key) {
            return Err(AppError::NotFound(format!("blob {}", key)));
        }
        Ok(format!("{}/{}", self.base_url, key))
    }
}
