// src/infrastructure/image_source.rs
//
// Local image handed over by a picker (a path plus an optional display
// name), read into memory before a poster upload.

use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::domain::{DomainError, PosterImage};
use crate::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub path: PathBuf,
    pub file_name: Option<String>,
}

impl ImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Name used in the upload key: the picker's name, else the path's
    /// file name, else `image_{unix_millis}.jpg`.
    pub fn resolved_file_name(&self) -> String {
        self.file_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| {
                self.path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| format!("image_{}.jpg", Utc::now().timestamp_millis()))
    }

    /// Read the image into a pending poster upload.
    pub async fn load(&self) -> AppResult<PosterImage> {
        // A bad path is bad user input, not a missing catalog record
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            DomainError::UnreadableImage {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        log::debug!("read {} bytes from {}", bytes.len(), self.path.display());
        Ok(PosterImage::pending(bytes, self.resolved_file_name()))
    }
}

/// MIME type for an uploaded poster, guessed from its file name.
pub fn content_type_for(file_name: &str) -> String {
    mime_guess::from_path(Path::new(file_name))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
