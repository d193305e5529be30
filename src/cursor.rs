//! # Cursor Utilities
//!
//! Opaque keyset cursors for paginated list endpoints. A cursor wraps the
//! id of the last row on the previous page.

use crate::error::ApiError;
use axum::http::StatusCode;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Payload carried inside a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorData {
    /// Id of the last row already returned
    pub after_id: i32,
}

fn invalid(message: &str) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
}

/// Encode a keyset position as an opaque base64 string
pub fn encode_cursor(after_id: i32) -> String {
    let json = serde_json::json!({ "after_id": after_id }).to_string();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(json.as_bytes())
}

/// Decode a cursor produced by [`encode_cursor`]
pub fn decode_cursor(cursor: &str) -> Result<CursorData, ApiError> {
    if cursor.is_empty() {
        return Err(invalid("cursor cannot be empty"));
    }

    if cursor.len() > 200 {
        return Err(invalid("cursor is too long"));
    }

    if !cursor
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(invalid("cursor contains invalid characters"));
    }

    let decoded = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| invalid("cursor is not valid base64"))?;

    let cursor_data: CursorData =
        serde_json::from_slice(&decoded).map_err(|_| invalid("cursor contains invalid JSON structure"))?;

    if cursor_data.after_id < 0 {
        return Err(invalid("cursor contains invalid ID"));
    }

    Ok(cursor_data)
}
