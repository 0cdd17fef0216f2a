// src/domain/mod.rs
//
// Domain Root - The Single Source of Truth for Domain API
//
// All other modules import from `crate::domain::*`

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod movie;
pub mod poster;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use movie::{
    validate_movie_fields, validate_movie_id, Movie, MovieDocument, MovieFields, MovieForm,
    MovieId, MAX_RATING, MIN_RATING, MOVIES_COLLECTION,
};

pub use poster::{poster_upload_key, PosterImage, POSTER_KEY_PREFIX};

// ============================================================================
// DOMAIN ERROR TYPES
// ============================================================================

use thiserror::Error;

/// Domain-level errors
/// These represent violations of business rules and invariants
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be a number, got '{value}'")]
    NotNumeric { field: &'static str, value: String },

    #[error("Rating {0} is outside the allowed range 0-10")]
    RatingOutOfRange(f64),

    #[error("Cannot read poster image {path}: {reason}")]
    UnreadableImage { path: String, reason: String },
}

/// Domain result type
pub type DomainResult<T> = Result<T, DomainError>;
