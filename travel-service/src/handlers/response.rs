//! Response envelope shared by every endpoint
//!
//! Successful responses carry `data` and, for listings, `pagination`.
//! Failures carry `error` (see [`crate::error::AppError`]).
//!
//! # Example
//!
//! ```rust
//! use travel_service::handlers::{ApiResponse, PaginationMeta};
//!
//! let pagination = PaginationMeta::new(Some(2), Some(10), Some(25));
//! let response = ApiResponse::paginated(vec!["a", "b"], pagination);
//! assert_eq!(response.pagination.unwrap().total_pages, 3);
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ErrorBody;

/// `data` of a successful delete
pub const DELETED_MESSAGE: &str = "success delete data";

/// Outcome marker of the envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Pagination block of a listing response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

impl PaginationMeta {
    /// Build pagination metadata
    ///
    /// Returns `None` unless page, size and count are all known, and size
    /// and count are both positive.
    ///
    /// ```rust
    /// use travel_service::handlers::PaginationMeta;
    ///
    /// let meta = PaginationMeta::new(Some(2), Some(10), Some(25)).unwrap();
    /// assert_eq!(meta.total_pages, 3);
    /// assert!(PaginationMeta::new(Some(1), Some(10), Some(0)).is_none());
    /// ```
    #[must_use]
    pub fn new(page: Option<i64>, size: Option<i64>, count: Option<i64>) -> Option<Self> {
        let (page, size, count) = (page?, size?, count?);
        if size <= 0 || count <= 0 {
            return None;
        }

        Some(Self {
            total_items: count,
            total_pages: calculate_total_pages(count, size),
            current_page: page,
            page_size: size,
        })
    }
}

fn calculate_total_pages(total: i64, size: i64) -> i64 {
    (total + size - 1) / size
}

/// The `{status, data, error, pagination}` envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationMeta>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            error: None,
            pagination: None,
        }
    }

    #[must_use]
    pub fn paginated(data: T, pagination: Option<PaginationMeta>) -> Self {
        Self {
            pagination,
            ..Self::success(data)
        }
    }

    #[must_use]
    pub fn error(error: ErrorBody) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            error: Some(error),
            pagination: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// A success envelope sent with `201 Created`
#[derive(Debug, Clone)]
pub struct Created<T>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> Response {
        (StatusCode::CREATED, Json(ApiResponse::success(self.0))).into_response()
    }
}
