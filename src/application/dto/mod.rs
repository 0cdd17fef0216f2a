// src/application/dto/mod.rs
//
// Data Transfer Objects
//
// CRITICAL PRINCIPLES:
// - DTOs are display-friendly representations
// - DTOs carry raw input; parsing and validation happen in the domain
// - DTOs are simple, serializable structs
// - Output DTOs convert FROM domain entities only

use serde::{Deserialize, Serialize};

use crate::domain::{Movie, MovieForm};

// ============================================================================
// MOVIE DTOs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDto {
    pub id: String,
    pub title: String,
    pub director: String,
    pub year: i32,
    pub genre: String,
    pub rating: f64,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Poster choice for a save: a local file to upload, or the URL of an
/// already uploaded poster to keep. Neither means no poster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosterInputDto {
    pub path: Option<String>,
    /// Name reported by the picker; defaults to the path's file name
    pub file_name: Option<String>,
    pub existing_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMovieDto {
    #[serde(flatten)]
    pub form: MovieForm,
    #[serde(default)]
    pub poster: PosterInputDto,
}

/// Partial edit: unset fields keep the current record's value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditMovieDto {
    pub title: Option<String>,
    pub director: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub rating: Option<String>,
    pub description: Option<String>,
    pub poster_path: Option<String>,
    pub poster_file_name: Option<String>,
    #[serde(default)]
    pub clear_poster: bool,
}

impl EditMovieDto {
    /// Overlay the provided fields on a form pre-filled from the record.
    pub fn apply_to(&self, form: &mut MovieForm) {
        let overlay = |target: &mut String, value: &Option<String>| {
            if let Some(value) = value {
                *target = value.clone();
            }
        };

        overlay(&mut form.title, &self.title);
        overlay(&mut form.director, &self.director);
        overlay(&mut form.year, &self.year);
        overlay(&mut form.genre, &self.genre);
        overlay(&mut form.rating, &self.rating);
        overlay(&mut form.description, &self.description);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMovieDto {
    pub id: String,
}

// ============================================================================
// RESPONSE DTOs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

// ============================================================================
// CONVERSION HELPERS (Domain → DTO)
// ============================================================================

impl From<Movie> for MovieDto {
    fn from(movie: Movie) -> Self {
        Self {
            id: movie.id.to_string(),
            title: movie.title,
            director: movie.director,
            year: movie.year,
            genre: movie.genre,
            rating: movie.rating,
            description: movie.description,
            image_url: movie.image_url,
            created_at: movie.created_at.map(|d| d.to_rfc3339()),
            updated_at: movie.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}
