use super::entity::{MovieFields, MovieId};
use crate::domain::{DomainError, DomainResult};

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// Validates all field invariants of a movie before it is written.
/// The document store does not enforce any of these.
pub fn validate_movie_fields(fields: &MovieFields) -> DomainResult<()> {
    validate_required("title", &fields.title)?;
    validate_required("director", &fields.director)?;
    validate_rating(fields.rating)?;
    Ok(())
}

/// Identifiers must be non-blank to address a document.
pub fn validate_movie_id(id: &MovieId) -> DomainResult<()> {
    if id.is_blank() {
        return Err(DomainError::MissingField { field: "id" });
    }
    Ok(())
}

fn validate_required(field: &'static str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::MissingField { field });
    }
    Ok(())
}

/// NaN fails both comparisons and is rejected here too.
fn validate_rating(rating: f64) -> DomainResult<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        return Err(DomainError::RatingOutOfRange(rating));
    }
    Ok(())
}

/// Invariants that must hold true for the Movie domain:
///
/// 1. Identity is assigned by the store and never changes
/// 2. Title and director cannot be blank
/// 3. 0 <= rating <= 10 at write time
/// 4. Genre and description are free text and may be empty
/// 5. A missing poster URL means "no poster"
