// src/domain/poster.rs
//
// Poster input for create/update. Resolved exactly once at the start of an
// orchestration into the URL that gets written to the record.

use chrono::{DateTime, Utc};
use std::fmt;

/// Blob-store folder holding every poster
pub const POSTER_KEY_PREFIX: &str = "movies";

#[derive(Clone, PartialEq, Eq, Default)]
pub enum PosterImage {
    /// No poster: the record is written with a null image reference
    #[default]
    None,

    /// New image bytes that must be uploaded before the record is written
    PendingUpload { bytes: Vec<u8>, file_name: String },

    /// Already uploaded poster, reused as-is
    ExistingUrl(String),
}

impl PosterImage {
    pub fn pending(bytes: Vec<u8>, file_name: impl Into<String>) -> Self {
        PosterImage::PendingUpload {
            bytes,
            file_name: file_name.into(),
        }
    }

    /// Keeps a previously resolved URL; a missing or empty URL means no poster.
    pub fn keep(previous_url: Option<String>) -> Self {
        match previous_url {
            Some(url) if !url.trim().is_empty() => PosterImage::ExistingUrl(url),
            _ => PosterImage::None,
        }
    }

    pub fn needs_upload(&self) -> bool {
        matches!(self, PosterImage::PendingUpload { .. })
    }
}

// Byte payloads are summarized so logs stay readable.
impl fmt::Debug for PosterImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PosterImage::None => f.write_str("None"),
            PosterImage::PendingUpload { bytes, file_name } => f
                .debug_struct("PendingUpload")
                .field("file_name", file_name)
                .field("len", &bytes.len())
                .finish(),
            PosterImage::ExistingUrl(url) => f.debug_tuple("ExistingUrl").field(url).finish(),
        }
    }
}

/// Blob key for a poster upload: `movies/{unix_millis}_{file_name}`.
///
/// Two uploads of the same file name in the same millisecond share a key;
/// the later upload replaces the earlier blob.
pub fn poster_upload_key(at: DateTime<Utc>, file_name: &str) -> String {
    format!(
        "{}/{}_{}",
        POSTER_KEY_PREFIX,
        at.timestamp_millis(),
        file_name
    )
}
