// src/services/movie_service.rs
//
// Movie catalog orchestration: cached queries plus create/update/delete.
//
// RULES:
// - Validation runs before any remote call
// - A pending poster is uploaded, and its URL resolved, before the record write
// - Mutations emit an event only after the store accepted the write
// - Cache invalidation is driven by those events (see events::handlers)
// - Failures propagate unchanged: no retry, no rollback

use chrono::Utc;
use futures::FutureExt;
use std::sync::Arc;

use crate::cache::{Fetcher, QueryCache, QueryData, QueryKey};
use crate::domain::{
    poster_upload_key, validate_movie_fields, validate_movie_id, Movie, MovieDocument,
    MovieFields, MovieId, PosterImage, MOVIES_COLLECTION,
};
use crate::error::{AppError, AppResult};
use crate::events::{
    register_cache_invalidation_handlers, EventBus, MovieCreated, MovieDeleted, MovieUpdated,
    PosterUploaded,
};
use crate::infrastructure::content_type_for;
use crate::repositories::{BlobStore, Document, DocumentStore};

#[derive(Debug, Clone)]
pub struct CreateMovieRequest {
    pub fields: MovieFields,
    pub image: PosterImage,
}

#[derive(Debug, Clone)]
pub struct UpdateMovieRequest {
    pub id: MovieId,
    pub fields: MovieFields,
    /// `ExistingUrl` keeps the current poster, `None` clears it
    pub image: PosterImage,
}

pub struct MovieService {
    documents: Arc<dyn DocumentStore>,
    blobs: Arc<dyn BlobStore>,
    cache: QueryCache,
    event_bus: Arc<EventBus>,
}

impl MovieService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        blobs: Arc<dyn BlobStore>,
        cache: QueryCache,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            documents,
            blobs,
            cache,
            event_bus,
        }
    }

    /// Wire mutation events to invalidation of this service's cache.
    /// Call once per cache/bus pair.
    pub fn register_event_handlers(&self) {
        register_cache_invalidation_handlers(&self.event_bus, &self.cache);
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Every movie in store order. Served from the cache until a create,
    /// update or delete invalidates the list.
    pub async fn list_movies(&self) -> AppResult<Vec<Movie>> {
        let data = self
            .cache
            .fetch(QueryKey::AllMovies, self.list_fetcher())
            .await?;

        data.as_movies()
            .map(<[Movie]>::to_vec)
            .ok_or_else(|| AppError::Other("movie list cache holds a single movie".to_string()))
    }

    /// One movie by id.
    ///
    /// A blank id disables the query: `Ok(None)` without a remote call.
    /// An id with no document fails with `NotFound`.
    pub async fn get_movie(&self, id: &MovieId) -> AppResult<Option<Movie>> {
        if id.is_blank() {
            log::debug!("get_movie with blank id, skipping");
            return Ok(None);
        }

        let data = self
            .cache
            .fetch(QueryKey::Movie(id.clone()), self.movie_fetcher(id.clone()))
            .await?;

        data.as_movie()
            .cloned()
            .map(Some)
            .ok_or_else(|| AppError::Other(format!("cache entry for movie {} holds a list", id)))
    }

    fn list_fetcher(&self) -> Fetcher {
        let documents = Arc::clone(&self.documents);
        Arc::new(move || {
            let documents = Arc::clone(&documents);
            async move {
                let docs = documents.list(MOVIES_COLLECTION).await?;
                let total = docs.len();
                let movies: Vec<Movie> = docs.into_iter().filter_map(decode_listed).collect();
                log::debug!("listed {} of {} movie documents", movies.len(), total);
                Ok(QueryData::Movies(movies))
            }
            .boxed()
        })
    }

    fn movie_fetcher(&self, id: MovieId) -> Fetcher {
        let documents = Arc::clone(&self.documents);
        Arc::new(move || {
            let documents = Arc::clone(&documents);
            let id = id.clone();
            async move {
                let doc = documents
                    .get(MOVIES_COLLECTION, id.as_str())
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Movie {}", id)))?;
                Ok(QueryData::Movie(decode_movie(doc)?))
            }
            .boxed()
        })
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    pub async fn create_movie(&self, request: CreateMovieRequest) -> AppResult<Movie> {
        validate_movie_fields(&request.fields)?;

        let image_url = self.resolve_poster(request.image).await?;
        let document = MovieDocument::for_create(request.fields, image_url, Utc::now());

        let id = self
            .documents
            .add(MOVIES_COLLECTION, document.to_fields()?)
            .await?;
        let movie = document.into_movie(MovieId::new(id));

        log::info!("Created movie {} ({})", movie.id, movie.title);
        self.event_bus
            .emit(MovieCreated::new(movie.id.clone(), movie.title.clone()));

        Ok(movie)
    }

    /// Rewrites every field of an existing movie plus `updatedAt`.
    /// The returned view has no `created_at`; it is not re-read.
    pub async fn update_movie(&self, request: UpdateMovieRequest) -> AppResult<Movie> {
        validate_movie_id(&request.id)?;
        validate_movie_fields(&request.fields)?;

        let poster_replaced = request.image.needs_upload();
        let image_url = self.resolve_poster(request.image).await?;
        let document = MovieDocument::for_update(request.fields, image_url, Utc::now());

        self.documents
            .overwrite(MOVIES_COLLECTION, request.id.as_str(), document.to_fields()?)
            .await?;
        let movie = document.into_movie(request.id);

        log::info!("Updated movie {}", movie.id);
        self.event_bus
            .emit(MovieUpdated::new(movie.id.clone(), poster_replaced));

        Ok(movie)
    }

    /// Deletes the record and returns its id. The poster blob stays.
    pub async fn delete_movie(&self, id: &MovieId) -> AppResult<MovieId> {
        validate_movie_id(id)?;

        self.documents.delete(MOVIES_COLLECTION, id.as_str()).await?;

        log::info!("Deleted movie {}", id);
        self.event_bus.emit(MovieDeleted::new(id.clone()));

        Ok(id.clone())
    }

    /// Turn poster input into the URL written to the record.
    async fn resolve_poster(&self, image: PosterImage) -> AppResult<Option<String>> {
        match image {
            PosterImage::None => Ok(None),
            PosterImage::ExistingUrl(url) => Ok(Some(url)),
            PosterImage::PendingUpload { bytes, file_name } => {
                let key = poster_upload_key(Utc::now(), &file_name);
                let content_type = content_type_for(&file_name);
                let size = bytes.len();

                self.blobs.upload(&key, bytes, &content_type).await?;
                let url = self.blobs.download_url(&key).await?;

                log::debug!("Poster {} uploaded ({} bytes)", key, size);
                self.event_bus
                    .emit(PosterUploaded::new(key, url.clone(), size));

                Ok(Some(url))
            }
        }
    }
}

fn decode_movie(doc: Document) -> AppResult<Movie> {
    let movie = MovieDocument::from_fields(doc.fields)?.into_movie(MovieId::new(doc.id));
    Ok(movie)
}

// A malformed document written by another client must not hide the rest of
// the catalog.
fn decode_listed(doc: Document) -> Option<Movie> {
    let id = doc.id.clone();
    match decode_movie(doc) {
        Ok(movie) => Some(movie),
        Err(e) => {
            log::warn!("Skipping malformed movie document {}: {}", id, e);
            None
        }
    }
}
