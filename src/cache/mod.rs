// src/cache/mod.rs
//
// Client-side query cache
//
// RULES:
// - The cache is an explicit service object, never global state
// - Entries are keyed by logical query identity
// - Remote calls happen only through fetchers handed in by services
// - Invalidation marks entries stale; observed entries refetch in background

pub mod query_cache;
pub mod query_key;

pub use query_cache::{CachedQuery, Fetcher, QueryCache, QueryObserver};
pub use query_key::{QueryData, QueryKey};
