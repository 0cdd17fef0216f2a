// src/integrations/mod.rs
//
// External Integrations Module
//
// Hosted backends reached over HTTP. Everything here implements the store
// traits from `repositories`; nothing here knows about movies.

pub mod firebase;

pub use firebase::{FirebaseSettings, FirebaseStorageBlobStore, FirestoreDocumentStore};
