// Mapping between Movie records and the flat field maps held by the
// document store. Keys are camelCase; timestamps are RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::entity::{Movie, MovieFields, MovieId};

/// Collection holding every movie document
pub const MOVIES_COLLECTION: &str = "movies";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDocument {
    pub title: String,
    pub director: String,
    #[serde(deserialize_with = "deserialize_year")]
    pub year: i32,
    #[serde(default)]
    pub genre: String,
    pub rating: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MovieDocument {
    /// Document written by a create: carries `createdAt`.
    pub fn for_create(fields: MovieFields, image_url: Option<String>, now: DateTime<Utc>) -> Self {
        Self::new(fields, image_url, Some(now), None)
    }

    /// Field set written by an update: every listed field plus `updatedAt`.
    /// `createdAt` is left out so the stored value survives.
    pub fn for_update(fields: MovieFields, image_url: Option<String>, now: DateTime<Utc>) -> Self {
        Self::new(fields, image_url, None, Some(now))
    }

    fn new(
        fields: MovieFields,
        image_url: Option<String>,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
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

    pub fn from_fields(fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(fields))
    }

    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde::ser::Error::custom(format!(
                "movie document serialized to non-object {other}"
            ))),
        }
    }

    pub fn into_movie(self, id: MovieId) -> Movie {
        Movie {
            id,
            title: self.title,
            director: self.director,
            year: self.year,
            genre: self.genre,
            rating: self.rating,
            description: self.description,
            image_url: self.image_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Other clients may store a whole-number year as a double.
fn deserialize_year<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let year = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid year {value}")))?;
    i32::try_from(year).map_err(|_| serde::de::Error::custom(format!("year {year} out of range")))
}
