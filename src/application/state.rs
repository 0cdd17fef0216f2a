// src/application/state.rs

use std::sync::Arc;

use crate::cache::QueryCache;
use crate::config::{AppConfig, Backend};
use crate::db::{
    create_connection_pool, database_path, get_connection, get_database_stats,
    initialize_database, verify_database_integrity,
};
use crate::error::{AppError, AppResult};
use crate::events::{create_event_bus, EventBus};
use crate::integrations::{FirebaseStorageBlobStore, FirestoreDocumentStore};
use crate::repositories::{
    BlobStore, DocumentStore, FsBlobStore, InMemoryBlobStore, InMemoryDocumentStore,
    SqliteDocumentStore,
};
use crate::services::MovieService;

/// Application state shared by every command.
/// All fields are Arc-wrapped for thread-safe sharing.
pub struct AppState {
    pub event_bus: Arc<EventBus>,
    pub cache: QueryCache,
    pub movie_service: Arc<MovieService>,
}

impl AppState {
    /// Wire a service over the given stores, with a fresh cache and bus.
    pub fn new(documents: Arc<dyn DocumentStore>, blobs: Arc<dyn BlobStore>) -> Self {
        let event_bus = Arc::new(create_event_bus());
        let cache = QueryCache::new();

        log::info!(
            "Catalog backed by {} documents and {} blobs",
            documents.name(),
            blobs.name()
        );

        let movie_service = Arc::new(MovieService::new(
            documents,
            blobs,
            cache.clone(),
            Arc::clone(&event_bus),
        ));

        // EVENT HANDLER REGISTRATION (WIRING)
        movie_service.register_event_handlers();

        Self {
            event_bus,
            cache,
            movie_service,
        }
    }

    /// Build the stores selected by `config` and wire them.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let (documents, blobs): (Arc<dyn DocumentStore>, Arc<dyn BlobStore>) = match config.backend
        {
            Backend::Memory => (
                Arc::new(InMemoryDocumentStore::new()),
                Arc::new(InMemoryBlobStore::default()),
            ),

            Backend::Local => {
                let pool = Arc::new(create_connection_pool(&database_path(&config.data_dir)?)?);
                {
                    let conn = get_connection(&pool)?;
                    initialize_database(&conn)?;
                    verify_database_integrity(&conn)?;
                    let stats = get_database_stats(&conn)?;
                    log::info!(
                        "Local catalog at {} holds {} documents",
                        config.data_dir.display(),
                        stats.document_count
                    );
                }
                (
                    Arc::new(SqliteDocumentStore::new(pool)),
                    Arc::new(FsBlobStore::new(config.blob_dir())?),
                )
            }

            Backend::Firebase => {
                let settings = config.firebase.as_ref().ok_or_else(|| {
                    AppError::Config("firebase backend selected without settings".to_string())
                })?;
                (
                    Arc::new(FirestoreDocumentStore::new(settings)?),
                    Arc::new(FirebaseStorageBlobStore::new(settings)?),
                )
            }
        };

        Ok(Self::new(documents, blobs))
    }
}
