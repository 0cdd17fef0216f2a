// src/application/commands/movie_commands.rs
//
// Movie Command Handlers
//
// RULES:
// - Accept DTOs
// - Call the movie service
// - Return DTOs
// - Never contain business logic

use crate::application::{
    dto::*,
    error_handling::{ErrorResponse, ToErrorResponse},
    state::AppState,
};
use crate::domain::{MovieForm, MovieId, PosterImage};
use crate::error::{AppError, AppResult};
use crate::infrastructure::ImageSource;
use crate::services::{CreateMovieRequest, UpdateMovieRequest};

pub type CommandResult<T> = Result<T, ErrorResponse>;

/// List all movies
pub async fn list_movies(state: &AppState) -> CommandResult<Vec<MovieDto>> {
    let movies = state.movie_service.list_movies().await.to_error_response()?;

    Ok(movies.into_iter().map(MovieDto::from).collect())
}

/// Get a single movie by ID. A blank ID yields `None`.
pub async fn get_movie(movie_id: String, state: &AppState) -> CommandResult<Option<MovieDto>> {
    let movie = state
        .movie_service
        .get_movie(&MovieId::new(movie_id))
        .await
        .to_error_response()?;

    Ok(movie.map(MovieDto::from))
}

/// Create a new movie
pub async fn create_movie(dto: SaveMovieDto, state: &AppState) -> CommandResult<MovieDto> {
    let fields = dto.form.parse().map_err(AppError::from).to_error_response()?;
    let image = load_poster(&dto.poster).await.to_error_response()?;

    let movie = state
        .movie_service
        .create_movie(CreateMovieRequest { fields, image })
        .await
        .to_error_response()?;

    Ok(MovieDto::from(movie))
}

/// Replace every field of a movie
pub async fn update_movie(
    movie_id: String,
    dto: SaveMovieDto,
    state: &AppState,
) -> CommandResult<MovieDto> {
    let fields = dto.form.parse().map_err(AppError::from).to_error_response()?;
    let image = load_poster(&dto.poster).await.to_error_response()?;

    let movie = state
        .movie_service
        .update_movie(UpdateMovieRequest {
            id: MovieId::new(movie_id),
            fields,
            image,
        })
        .await
        .to_error_response()?;

    Ok(MovieDto::from(movie))
}

/// Edit a movie starting from its current values; the poster is kept
/// unless a new one is given or clearing is requested.
pub async fn edit_movie(
    movie_id: String,
    dto: EditMovieDto,
    state: &AppState,
) -> CommandResult<MovieDto> {
    let id = MovieId::new(movie_id);
    let current = state
        .movie_service
        .get_movie(&id)
        .await
        .to_error_response()?
        .ok_or_else(|| ErrorResponse::validation("A movie id is required".to_string()))?;

    let mut form = MovieForm::from_movie(&current);
    dto.apply_to(&mut form);

    let poster = match (&dto.poster_path, dto.clear_poster) {
        (Some(path), _) => PosterInputDto {
            path: Some(path.clone()),
            file_name: dto.poster_file_name.clone(),
            existing_url: None,
        },
        (None, true) => PosterInputDto::default(),
        (None, false) => PosterInputDto {
            existing_url: current.image_url.clone(),
            ..PosterInputDto::default()
        },
    };

    update_movie(id.to_string(), SaveMovieDto { form, poster }, state).await
}

/// Delete a movie
pub async fn delete_movie(movie_id: String, state: &AppState) -> CommandResult<DeletedMovieDto> {
    let id = state
        .movie_service
        .delete_movie(&MovieId::new(movie_id))
        .await
        .to_error_response()?;

    Ok(DeletedMovieDto { id: id.to_string() })
}

async fn load_poster(poster: &PosterInputDto) -> AppResult<PosterImage> {
    match &poster.path {
        Some(path) => {
            let mut source = ImageSource::new(path);
            if let Some(name) = &poster.file_name {
                source = source.with_file_name(name);
            }
            source.load().await
        }
        None => Ok(PosterImage::keep(poster.existing_url.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error_handling::ErrorType;
    use crate::repositories::{InMemoryBlobStore, InMemoryDocumentStore};
    use std::sync::Arc;

    fn state() -> AppState {
        AppState::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(InMemoryBlobStore::default()),
        )
    }

    fn form(title: &str, rating: &str) -> MovieForm {
        MovieForm {
            title: title.to_string(),
            director: "Villeneuve".to_string(),
            year: "2021".to_string(),
            genre: "Sci-Fi".to_string(),
            rating: rating.to_string(),
            description: String::new(),
        }
    }

    fn save(title: &str, rating: &str) -> SaveMovieDto {
        SaveMovieDto {
            form: form(title, rating),
            poster: PosterInputDto::default(),
        }
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let state = state();

        let created = create_movie(save("Dune", "8.5"), &state).await.unwrap();
        let listed = list_movies(&state).await.unwrap();

        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn test_non_numeric_rating_is_validation_error() {
        let state = state();

        let err = create_movie(save("Dune", "great"), &state).await.unwrap_err();

        assert_eq!(err.error_type, ErrorType::Validation);
        assert!(list_movies(&state).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_poster_file_is_a_validation_error() {
        let state = state();
        let mut dto = save("Dune", "8");
        dto.poster.path = Some("/definitely/missing/poster.jpg".to_string());

        let err = create_movie(dto, &state).await.unwrap_err();

        assert_eq!(err.error_type, ErrorType::Validation);
        assert!(err
            .details
            .unwrap_or_default()
            .contains("/definitely/missing/poster.jpg"));
        assert!(state.movie_service.list_movies().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_poster_file() {
        let state = state();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("IMG_0001");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let mut dto = save("Dune", "8");
        dto.poster = PosterInputDto {
            path: Some(path.to_string_lossy().into_owned()),
            file_name: Some("dune.jpg".to_string()),
            existing_url: None,
        };

        let created = create_movie(dto, &state).await.unwrap();

        assert!(created
            .image_url
            .as_deref()
            .map_or(false, |url| url.starts_with("memory://blobs/movies/") && url.ends_with("_dune.jpg")));
    }

    #[tokio::test]
    async fn test_edit_prefills_and_keeps_poster() {
        let state = state();
        let mut dto = save("Dune", "8");
        dto.poster.existing_url = Some("https://img/dune.jpg".to_string());
        let created = create_movie(dto, &state).await.unwrap();

        let edited = edit_movie(
            created.id.clone(),
            EditMovieDto {
                rating: Some("9".to_string()),
                ..EditMovieDto::default()
            },
            &state,
        )
        .await
        .unwrap();

        assert_eq!(edited.title, "Dune");
        assert_eq!(edited.rating, 9.0);
        assert_eq!(edited.image_url.as_deref(), Some("https://img/dune.jpg"));

        let cleared = edit_movie(
            created.id.clone(),
            EditMovieDto {
                clear_poster: true,
                ..EditMovieDto::default()
            },
            &state,
        )
        .await
        .unwrap();
        assert!(cleared.image_url.is_none());
    }

    #[tokio::test]
    async fn test_edit_unknown_movie_is_not_found() {
        let state = state();

        let err = edit_movie("ghost".to_string(), EditMovieDto::default(), &state)
            .await
            .unwrap_err();

        assert_eq!(err.error_type, ErrorType::NotFound);
    }

    #[tokio::test]
    async fn test_get_blank_id_is_none() {
        let state = state();
        assert_eq!(get_movie(String::new(), &state).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_returns_id() {
        let state = state();
        let created = create_movie(save("Dune", "8"), &state).await.unwrap();

        let deleted = delete_movie(created.id.clone(), &state).await.unwrap();

        assert_eq!(deleted.id, created.id);
        assert!(list_movies(&state).await.unwrap().is_empty());
    }
}
