//! # Common API Types
//!
//! Shared request/response types used across handlers: pagination, simple
//! acknowledgement bodies and extractors whose rejections render as
//! problem+json.

use axum::extract::{FromRequest, FromRequestParts};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::{ApiError, validation_error};

pub const DEFAULT_PAGE_LIMIT: u64 = 50;
pub const MAX_PAGE_LIMIT: u64 = 100;

/// JSON body extractor mapping rejections to `VALIDATION_FAILED`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor mapping rejections to `VALIDATION_FAILED`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Path extractor mapping rejections to `VALIDATION_FAILED`
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// Generic paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// List of items for the current page
    pub data: Vec<T>,
    /// Opaque cursor for fetching the next page (null if this is the last page)
    pub next_cursor: Option<String>,
    /// Convenience field indicating if more pages exist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
}

impl<T> PaginatedResponse<T> {
    /// Create a new paginated response
    pub fn new(data: Vec<T>, next_cursor: Option<String>) -> Self {
        let has_more = next_cursor.is_some();
        Self {
            data,
            next_cursor,
            has_more: Some(has_more),
        }
    }

    /// Create a response with no more pages
    pub fn final_page(data: Vec<T>) -> Self {
        Self {
            data,
            next_cursor: None,
            has_more: Some(false),
        }
    }

    /// Builds a page from a repository result, mapping each row.
    pub fn from_page<M>(page: crate::repositories::Page<M>, map: impl FnMut(M) -> T) -> Self {
        let next_cursor = page.next_after.map(encode_cursor);
        Self::new(page.items.into_iter().map(map).collect(), next_cursor)
    }
}

/// Pagination query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page size (1..=100, default 50)
    pub limit: Option<u64>,
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
}

impl PageParams {
    /// Validates the parameters into a repository page request.
    pub fn resolve(&self) -> Result<crate::repositories::PageRequest, ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(validation_error(
                "Invalid pagination parameters",
                serde_json::json!({ "limit": "must be between 1 and 100" }),
            ));
        }

        let after_id = match self.cursor.as_deref() {
            Some(cursor) => Some(decode_cursor(cursor)?.after_id),
            None => None,
        };

        Ok(crate::repositories::PageRequest { limit, after_id })
    }
}

/// Plain acknowledgement body, e.g. `{"detail": "Successfully removed"}`
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in PATCH bodies. Use with `#[serde(default)]`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_default_limit() {
        let page = PageParams::default().resolve().unwrap();
        assert_eq!(page.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(page.after_id, None);
    }

    #[test]
    fn page_params_reject_out_of_range_limit() {
        for limit in [0, 101] {
            let params = PageParams {
                limit: Some(limit),
                cursor: None,
            };
            let err = params.resolve().unwrap_err();
            assert_eq!(err.code, "VALIDATION_FAILED".into());
        }
    }

    #[test]
    fn page_params_decode_cursor() {
        let params = PageParams {
            limit: Some(10),
            cursor: Some(encode_cursor(7)),
        };
        let page = params.resolve().unwrap();
        assert_eq!(page.after_id, Some(7));
    }

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        office_id: Option<Option<i32>>,
    }

    #[test]
    fn nullable_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.office_id, None);
        let cleared: Patch = serde_json::from_str(r#"{"office_id": null}"#).unwrap();
        assert_eq!(cleared.office_id, Some(None));
        let set: Patch = serde_json::from_str(r#"{"office_id": 3}"#).unwrap();
        assert_eq!(set.office_id, Some(Some(3)));
    }

    #[test]
    fn paginated_response_has_more_follows_cursor() {
        let page = PaginatedResponse::new(vec![1, 2], Some("abc".to_string()));
        assert_eq!(page.has_more, Some(true));

        let last: PaginatedResponse<i32> = PaginatedResponse::final_page(vec![]);
        assert_eq!(last.has_more, Some(false));
        assert!(last.next_cursor.is_none());
    }
}
