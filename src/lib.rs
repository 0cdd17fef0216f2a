// src/lib.rs
// MovieHub - Personal movie catalog
//
// Architecture:
// - Domain-centric: records, validation and poster input live in the domain
// - Event-driven: mutations emit events, the query cache reacts to them
// - Explicit: the cache is a service object, never ambient state
// - Pluggable stores: memory, local (SQLite + files) or Firebase

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod repositories;
pub mod services;

// ============================================================================
// APPLICATION LAYER
// ============================================================================

pub mod application;
pub mod integrations;

// ============================================================================
// PUBLIC API - Domain
// ============================================================================

pub use domain::{
    poster_upload_key, validate_movie_fields, validate_movie_id, DomainError, Movie,
    MovieDocument, MovieFields, MovieForm, MovieId, PosterImage, MAX_RATING, MIN_RATING,
    MOVIES_COLLECTION,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult, ErrorKind};

// ============================================================================
// PUBLIC API - Cache
// ============================================================================

pub use cache::{CachedQuery, Fetcher, QueryCache, QueryData, QueryKey, QueryObserver};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus, register_cache_invalidation_handlers, DomainEvent, EventBus,
    EventLogEntry, MovieCreated, MovieDeleted, MovieUpdated, PosterUploaded,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Stores
// ============================================================================

pub use repositories::{
    BlobStore, CallJournal, Document, DocumentStore, Fields, FsBlobStore, InMemoryBlobStore,
    InMemoryDocumentStore, SqliteDocumentStore, StoreCall,
};

pub use integrations::{FirebaseSettings, FirebaseStorageBlobStore, FirestoreDocumentStore};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{CreateMovieRequest, MovieService, UpdateMovieRequest};

// ============================================================================
// PUBLIC API - Application Layer
// ============================================================================

pub use application::{AppState, ErrorResponse, ErrorType};
pub use config::{AppConfig, Backend};
pub use infrastructure::ImageSource;

// Re-export application submodules
pub use application::commands;
pub use application::dto;
