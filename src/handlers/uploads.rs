//! Multipart upload helpers shared by the image, transcript and grade sheet
//! endpoints.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use utoipa::ToSchema;

use crate::error::{ApiError, payload_too_large};
use crate::media::{MediaError, MediaKind, MediaStore};

/// Multipart part name every upload endpoint reads.
pub const FILE_FIELD: &str = "file";

/// Multipart form accepted by upload endpoints
#[derive(Debug, ToSchema)]
pub struct FileUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// A file part read fully into memory.
#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// Reads the part named `field`, skipping any others.
///
/// Stops with 413 as soon as the part grows past `limit` bytes.
pub async fn read_file_field(
    multipart: &mut Multipart,
    field: &str,
    limit: usize,
) -> Result<Option<UploadedFile>, ApiError> {
    while let Some(mut part) = multipart.next_field().await.map_err(multipart_error)? {
        if part.name() != Some(field) {
            continue;
        }

        let file_name = part.file_name().map(str::to_string);
        let mut bytes = Vec::new();
        while let Some(chunk) = part.chunk().await.map_err(multipart_error)? {
            if bytes.len() + chunk.len() > limit {
                return Err(payload_too_large(limit));
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok(Some(UploadedFile { file_name, bytes }));
    }
    Ok(None)
}

/// Stores the multipart `file` part as `kind` for `owner_id` and returns the
/// relative media path.
pub async fn store_media(
    media: &MediaStore,
    multipart: &mut Multipart,
    kind: MediaKind,
    owner_id: i32,
) -> Result<String, ApiError> {
    let upload = read_file_field(multipart, FILE_FIELD, media.max_bytes())
        .await?
        .ok_or(MediaError::Missing)?;
    let file_name = upload.file_name.unwrap_or_default();
    let path = media.save(kind, owner_id, &file_name, &upload.bytes).await?;
    Ok(path)
}

fn multipart_error(error: MultipartError) -> ApiError {
    let status = error.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::new(status, "PAYLOAD_TOO_LARGE", error.body_text());
    }
    ApiError::new(
        StatusCode::BAD_REQUEST,
        "VALIDATION_FAILED",
        format!("Invalid multipart body: {}", error.body_text()),
    )
}
