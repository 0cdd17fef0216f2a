// src/events/handlers/cache_invalidation_handler.rs
//
// Bridges movie mutation events to query cache invalidation.
//
// Which keys go stale:
// - MovieCreated: the movie list
// - MovieUpdated: the movie list and that movie's detail query
// - MovieDeleted: the movie list only (a cached detail query for the
//   deleted id stays until invalidated some other way)

use crate::cache::{QueryCache, QueryKey};
use crate::events::types::{MovieCreated, MovieDeleted, MovieUpdated};
use crate::events::EventBus;

/// Registers the invalidation handlers for `cache` on `bus`.
pub fn register_cache_invalidation_handlers(bus: &EventBus, cache: &QueryCache) {
    let created_cache = cache.clone();
    bus.subscribe::<MovieCreated, _>(move |event| {
        log::debug!("movie {} created, invalidating list", event.movie_id);
        created_cache.invalidate(&QueryKey::AllMovies);
    });

    let updated_cache = cache.clone();
    bus.subscribe::<MovieUpdated, _>(move |event| {
        log::debug!("movie {} updated, invalidating list and detail", event.movie_id);
        updated_cache.invalidate(&QueryKey::AllMovies);
        updated_cache.invalidate(&QueryKey::Movie(event.movie_id.clone()));
    });

    let deleted_cache = cache.clone();
    bus.subscribe::<MovieDeleted, _>(move |event| {
        log::debug!("movie {} deleted, invalidating list", event.movie_id);
        deleted_cache.invalidate(&QueryKey::AllMovies);
    });
}
