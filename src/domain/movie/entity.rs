use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque record identifier assigned by the document store on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Blank identifiers never address a record.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for MovieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MovieId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for MovieId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The user-editable part of a movie record.
///
/// Create and update both write every field listed here; there is no
/// partial patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieFields {
    pub title: String,
    pub director: String,
    pub year: i32,
    pub genre: String,
    pub rating: f64,
    pub description: String,
}

/// A movie record as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Immutable identifier assigned by the store
    pub id: MovieId,

    pub title: String,
    pub director: String,
    pub year: i32,
    pub genre: String,

    /// 0.0 ..= 10.0
    pub rating: f64,

    pub description: String,

    /// Poster download URL, `None` when the movie has no poster
    pub image_url: Option<String>,

    /// Creation timestamp (absent on records written by other clients
    /// and on the view returned from an update)
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp, absent until the first update
    pub updated_at: Option<DateTime<Utc>>,
}

impl Movie {
    /// Assemble a record view from its parts.
    pub fn from_fields(
        id: MovieId,
        fields: MovieFields,
        image_url: Option<String>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            title: fields.title,
            director: fields.director,
            year: fields.year,
            genre: fields.genre,
            rating: fields.rating,
            description: fields.description,
            image_url,
            created_at,
            updated_at,
        }
    }

    /// The editable fields of this record.
    pub fn fields(&self) -> MovieFields {
        MovieFields {
            title: self.title.clone(),
            director: self.director.clone(),
            year: self.year,
            genre: self.genre.clone(),
            rating: self.rating,
            description: self.description.clone(),
        }
    }

    pub fn has_poster(&self) -> bool {
        self.image_url.is_some()
    }
}
