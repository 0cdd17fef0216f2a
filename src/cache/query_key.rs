// src/cache/query_key.rs
use std::fmt;

use crate::domain::{Movie, MovieId};

/// Logical identity of a cached query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// Every movie in the catalog
    AllMovies,

    /// A single movie by id
    Movie(MovieId),
}

impl QueryKey {
    pub fn movie(id: impl Into<MovieId>) -> Self {
        QueryKey::Movie(id.into())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::AllMovies => write!(f, "movies"),
            QueryKey::Movie(id) => write!(f, "movie:{}", id),
        }
    }
}

/// Value held by a cache entry
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Movies(Vec<Movie>),
    Movie(Movie),
}

impl QueryData {
    pub fn as_movies(&self) -> Option<&[Movie]> {
        match self {
            QueryData::Movies(movies) => Some(movies),
            QueryData::Movie(_) => None,
        }
    }

    pub fn as_movie(&self) -> Option<&Movie> {
        match self {
            QueryData::Movie(movie) => Some(movie),
            QueryData::Movies(_) => None,
        }
    }
}
