// src/repositories/document_store.rs
//
// Document store contract consumed by the data-access layer.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::AppResult;

/// Flat mapping of field name to scalar/string value
pub type Fields = Map<String, Value>;

/// A stored document: its store-assigned id and its fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs ("memory", "sqlite", "firestore")
    fn name(&self) -> &'static str;

    /// Every document in the collection, in store order.
    async fn list(&self, collection: &str) -> AppResult<Vec<Document>>;

    /// `None` when no document exists at `id`.
    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<Document>>;

    /// Stores a new document and returns its generated id.
    async fn add(&self, collection: &str, fields: Fields) -> AppResult<String>;

    /// Rewrites every given field of an existing document. Fields not named
    /// keep their stored value. Fails with `NotFound` when `id` is absent.
    async fn overwrite(&self, collection: &str, id: &str, fields: Fields) -> AppResult<()>;

    /// Removes the document. Deleting a missing id succeeds.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;
}
