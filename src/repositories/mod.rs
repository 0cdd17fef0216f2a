// src/repositories/mod.rs
//
// Storage seams
//
// CRITICAL RULES:
// - Stores are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO cache invalidation
// - Documents are flat field maps; typing happens in the domain

pub mod blob_store;
pub mod document_store;
pub mod fs_blob_store;
pub mod memory;
pub mod sqlite_document_store;

pub use blob_store::BlobStore;
pub use document_store::{Document, DocumentStore, Fields};
pub use fs_blob_store::FsBlobStore;
pub use memory::{CallJournal, InMemoryBlobStore, InMemoryDocumentStore, StoreCall};
pub use sqlite_document_store::SqliteDocumentStore;

#[cfg(test)]
pub use blob_store::MockBlobStore;
#[cfg(test)]
pub use document_store::MockDocumentStore;
