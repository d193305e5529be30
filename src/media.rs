//! Storage for uploaded profile images and transcripts of records.
//!
//! Files land under the configured media root as
//! `school/images/<user_id><ext>` and `school/TOR/<user_id><ext>`; the stored
//! relative path is what the profile rows keep.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use thiserror::Error;

use crate::error::{ApiError, payload_too_large};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];
pub const TOR_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

/// Kind of document being stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Transcript,
}

impl MediaKind {
    fn directory(self) -> &'static str {
        match self {
            MediaKind::Image => "school/images",
            MediaKind::Transcript => "school/TOR",
        }
    }

    fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            MediaKind::Image => IMAGE_EXTENSIONS,
            MediaKind::Transcript => TOR_EXTENSIONS,
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no file was submitted")]
    Missing,
    #[error("file extension '{extension}' is not allowed; expected one of {allowed}")]
    UnsupportedExtension { extension: String, allowed: String },
    #[error("file is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("failed to write media file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for ApiError {
    fn from(error: MediaError) -> Self {
        match error {
            MediaError::Missing => ApiError::new(
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                "No file was submitted",
            ),
            MediaError::UnsupportedExtension { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "UNSUPPORTED_FILE_TYPE", error.to_string())
            }
            MediaError::TooLarge { limit, .. } => payload_too_large(limit),
            MediaError::Io(err) => {
                tracing::error!(error = %err, "Media write failed");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Failed to store uploaded file",
                )
            }
        }
    }
}

/// Writes uploads below a root directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_bytes: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Checks the size limit before any bytes are buffered for storage.
    pub fn check_size(&self, size: usize) -> Result<(), MediaError> {
        if size > self.max_bytes {
            return Err(MediaError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Relative storage path for an owner's upload, validating the extension.
    pub fn relative_path(
        &self,
        kind: MediaKind,
        owner_id: i32,
        file_name: &str,
    ) -> Result<String, MediaError> {
        let extension = file_extension(file_name).unwrap_or_default();
        let allowed = kind.allowed_extensions();
        if !allowed.contains(&extension.as_str()) {
            return Err(MediaError::UnsupportedExtension {
                extension,
                allowed: allowed.join(", "),
            });
        }
        Ok(format!("{}/{}.{}", kind.directory(), owner_id, extension))
    }

    /// Stores `bytes`, replacing any earlier upload for the same owner.
    /// Returns the relative path.
    pub async fn save(
        &self,
        kind: MediaKind,
        owner_id: i32,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        self.check_size(bytes.len())?;
        let relative = self.relative_path(kind, owner_id, file_name)?;

        let directory = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&directory).await?;
        self.remove_previous(&directory, owner_id, &relative).await?;

        tokio::fs::write(self.root.join(&relative), bytes).await?;
        tracing::info!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }

    async fn remove_previous(
        &self,
        directory: &Path,
        owner_id: i32,
        keep: &str,
    ) -> Result<(), MediaError> {
        let prefix = format!("{}.", owner_id);
        let mut entries = tokio::fs::read_dir(directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(&prefix) && !keep.ends_with(name.as_ref()) {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }
}

/// Lowercased extension without the dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}
