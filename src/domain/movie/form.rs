use serde::{Deserialize, Serialize};

use super::entity::{Movie, MovieFields};
use super::invariants::validate_movie_fields;
use crate::domain::{DomainError, DomainResult};

/// Raw text input for a movie, as typed into a form or passed on the
/// command line. Nothing here has been checked yet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieForm {
    pub title: String,
    pub director: String,
    pub year: String,
    pub genre: String,
    pub rating: String,
    pub description: String,
}

impl MovieForm {
    /// Pre-fill a form from an existing record (edit flow).
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            director: movie.director.clone(),
            year: movie.year.to_string(),
            genre: movie.genre.clone(),
            rating: movie.rating.to_string(),
            description: movie.description.clone(),
        }
    }

    /// Parse and validate the form.
    ///
    /// Checks run in form order (title, director, year, rating) and the
    /// first failure is reported. Text fields are kept as entered.
    pub fn parse(&self) -> DomainResult<MovieFields> {
        if self.title.trim().is_empty() {
            return Err(DomainError::MissingField { field: "title" });
        }
        if self.director.trim().is_empty() {
            return Err(DomainError::MissingField { field: "director" });
        }

        let year = parse_number::<i32>("year", &self.year)?;
        let rating = parse_number::<f64>("rating", &self.rating)?;

        let fields = MovieFields {
            title: self.title.clone(),
            director: self.director.clone(),
            year,
            genre: self.genre.clone(),
            rating,
            description: self.description.clone(),
        };

        validate_movie_fields(&fields)?;
        Ok(fields)
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> DomainResult<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::MissingField { field });
    }
    trimmed.parse::<T>().map_err(|_| DomainError::NotNumeric {
        field,
        value: raw.to_string(),
    })
}
