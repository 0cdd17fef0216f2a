// src/events/types.rs
//
// Domain events. Each event is an immutable fact about a mutation that
// already succeeded against the remote store.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::MovieId;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

macro_rules! domain_event {
    ($name:ident) => {
        impl DomainEvent for $name {
            fn event_id(&self) -> Uuid {
                self.event_id
            }
            fn occurred_at(&self) -> DateTime<Utc> {
                self.occurred_at
            }
            fn event_type(&self) -> &'static str {
                stringify!($name)
            }
        }
    };
}

// ============================================================================
// MOVIE EVENTS
// ============================================================================

/// Emitted after a new movie document was written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub movie_id: MovieId,
    pub title: String,
}

impl MovieCreated {
    pub fn new(movie_id: MovieId, title: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            movie_id,
            title,
        }
    }
}

domain_event!(MovieCreated);

/// Emitted after a movie document was overwritten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieUpdated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub movie_id: MovieId,
    pub poster_replaced: bool,
}

impl MovieUpdated {
    pub fn new(movie_id: MovieId, poster_replaced: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            movie_id,
            poster_replaced,
        }
    }
}

domain_event!(MovieUpdated);

/// Emitted after a movie document was deleted. Its poster blob, if any,
/// is left in the blob store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDeleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub movie_id: MovieId,
}

impl MovieDeleted {
    pub fn new(movie_id: MovieId) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            movie_id,
        }
    }
}

domain_event!(MovieDeleted);

// ============================================================================
// POSTER EVENTS
// ============================================================================

/// Emitted once a poster upload finished and its URL was resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterUploaded {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub key: String,
    pub url: String,
    pub size_bytes: usize,
}

impl PosterUploaded {
    pub fn new(key: String, url: String, size_bytes: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            key,
            url,
            size_bytes,
        }
    }
}

domain_event!(PosterUploaded);
