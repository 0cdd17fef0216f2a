pub mod document;
pub mod entity;
pub mod form;
pub mod invariants;

pub use document::{MovieDocument, MOVIES_COLLECTION};
pub use entity::{Movie, MovieFields, MovieId};
pub use form::MovieForm;
pub use invariants::{validate_movie_fields, validate_movie_id, MAX_RATING, MIN_RATING};
