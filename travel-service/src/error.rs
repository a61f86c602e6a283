//! Error types and HTTP response conversion
//!
//! Two families live here:
//!
//! - [`Error`] covers startup and infrastructure failures (configuration,
//!   I/O, pool creation, migrations, tracing setup).
//! - [`AppError`] is what request handling returns. It carries a stable
//!   [`ErrorCode`] for clients, a human message, optional structured
//!   details, and an optional cause that is logged but never serialized.

use std::fmt;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::handlers::response::ApiResponse;
use crate::mapper::MappingError;
use crate::repository::{RepositoryError, RepositoryErrorKind};

/// Boxed error used as an [`AppError`] cause
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Structured details attached to an error response
pub type Details = Map<String, Value>;

/// Message used for every payload validation failure
pub const VALIDATION_MESSAGE: &str = "Your request is invalid. Please check the details.";

// ============================================================================
// Error codes
// ============================================================================

/// Stable, client-facing error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "ERR_UNKNOWN")]
    Unknown,
    #[serde(rename = "ERR_INTERNAL")]
    Internal,
    #[serde(rename = "ERR_BAD_REQUEST")]
    BadRequest,
    #[serde(rename = "ERR_VALIDATION")]
    Validation,
    #[serde(rename = "ERR_UNAUTHENTICATED")]
    Unauthenticated,
    #[serde(rename = "ERR_TOKEN_EXPIRED")]
    TokenExpired,
    #[serde(rename = "ERR_UNAUTHORIZED")]
    Unauthorized,
    #[serde(rename = "ERR_NOT_FOUND")]
    NotFound,
    #[serde(rename = "ERR_DUPLICATE_ENTRY")]
    DuplicateEntry,
    #[serde(rename = "ERR_STATE_CONFLICT")]
    StateConflict,
    #[serde(rename = "ERR_RATE_LIMIT_EXCEEDED")]
    RateLimitExceeded,
    #[serde(rename = "ERR_SERVICE_UNAVAILABLE")]
    ServiceUnavailable,

    // Users
    #[serde(rename = "ERR_USER_NOT_FOUND")]
    UserNotFound,
    #[serde(rename = "ERR_EMAIL_EXISTS")]
    EmailExists,
    #[serde(rename = "ERR_PHONE_EXISTS")]
    PhoneExists,

    // Products
    #[serde(rename = "ERR_PRODUCT_NOT_FOUND")]
    ProductNotFound,
    #[serde(rename = "ERR_PRODUCT_NAME_EXISTS")]
    ProductNameExists,
    #[serde(rename = "ERR_SKU_EXISTS")]
    SkuExists,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "ERR_UNKNOWN",
            Self::Internal => "ERR_INTERNAL",
            Self::BadRequest => "ERR_BAD_REQUEST",
            Self::Validation => "ERR_VALIDATION",
            Self::Unauthenticated => "ERR_UNAUTHENTICATED",
            Self::TokenExpired => "ERR_TOKEN_EXPIRED",
            Self::Unauthorized => "ERR_UNAUTHORIZED",
            Self::NotFound => "ERR_NOT_FOUND",
            Self::DuplicateEntry => "ERR_DUPLICATE_ENTRY",
            Self::StateConflict => "ERR_STATE_CONFLICT",
            Self::RateLimitExceeded => "ERR_RATE_LIMIT_EXCEEDED",
            Self::ServiceUnavailable => "ERR_SERVICE_UNAVAILABLE",
            Self::UserNotFound => "ERR_USER_NOT_FOUND",
            Self::EmailExists => "ERR_EMAIL_EXISTS",
            Self::PhoneExists => "ERR_PHONE_EXISTS",
            Self::ProductNotFound => "ERR_PRODUCT_NOT_FOUND",
            Self::ProductNameExists => "ERR_PRODUCT_NAME_EXISTS",
            Self::SkuExists => "ERR_SKU_EXISTS",
        }
    }

    /// HTTP status a response with this code is sent with
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound | Self::UserNotFound | Self::ProductNotFound => StatusCode::NOT_FOUND,
            Self::DuplicateEntry
            | Self::StateConflict
            | Self::EmailExists
            | Self::PhoneExists
            | Self::ProductNameExists
            | Self::SkuExists => StatusCode::CONFLICT,
            Self::Validation | Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthenticated | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-level validation failure code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetailCode {
    InvalidValue,
    IsRequired,
    InvalidType,
    InvalidFormat,
    InvalidLength,
    LengthTooShort,
    LengthTooLong,
    ValueTooLow,
    ValueTooHigh,
    InvalidChoice,
}

impl DetailCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidValue => "INVALID_VALUE",
            Self::IsRequired => "IS_REQUIRED",
            Self::InvalidType => "INVALID_TYPE",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidLength => "INVALID_LENGTH",
            Self::LengthTooShort => "LENGTH_TOO_SHORT",
            Self::LengthTooLong => "LENGTH_TOO_LONG",
            Self::ValueTooLow => "VALUE_TOO_LOW",
            Self::ValueTooHigh => "VALUE_TOO_HIGH",
            Self::InvalidChoice => "INVALID_CHOICE",
        }
    }
}

impl fmt::Display for DetailCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Application error
// ============================================================================

/// Error returned by services and handlers
#[derive(Debug, Error)]
#[error("[{code}] {message}{}", cause_suffix(.source))]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Details>,
    #[source]
    pub source: Option<BoxError>,
}

fn cause_suffix(source: &Option<BoxError>) -> String {
    source
        .as_ref()
        .map(|cause| format!(": {}", cause))
        .unwrap_or_default()
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Details) -> Self {
        self.details = Some(details);
        self
    }

    /// Add one detail entry
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Wrap an unexpected failure
    pub fn internal(source: impl Into<BoxError>) -> Self {
        Self::new(ErrorCode::Internal, "an internal error occurred").with_source(source)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    /// Payload failed validation, one detail code per field
    pub fn validation(details: Details) -> Self {
        Self::new(ErrorCode::Validation, VALIDATION_MESSAGE).with_details(details)
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err.kind {
            RepositoryErrorKind::NotFound => Self::new(ErrorCode::NotFound, "record not found"),
            RepositoryErrorKind::UniqueViolation => {
                let details = err.unique.as_ref().map(|u| u.details()).unwrap_or_default();
                let error = Self::new(ErrorCode::DuplicateEntry, err.message.clone());
                if details.is_empty() {
                    error.with_source(err)
                } else {
                    error.with_details(details).with_source(err)
                }
            }
            _ => Self::internal(err),
        }
    }
}

impl From<MappingError> for AppError {
    fn from(err: MappingError) -> Self {
        Self::new(ErrorCode::Internal, "failed to map data").with_source(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

/// `error` member of the response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Details>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                code = %self.code,
                cause = self.source.as_ref().map(|s| s.to_string()).as_deref(),
                "{}", self.message
            );
        } else {
            tracing::debug!(code = %self.code, "{}", self.message);
        }

        let body = ApiResponse::<()>::error(ErrorBody {
            code: self.code,
            message: self.message,
            details: self.details,
        });

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Infrastructure errors
// ============================================================================

/// Startup and infrastructure error
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Database pool or query error outside a request
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tracing or exporter setup error
    #[error("Tracing error: {0}")]
    Tracing(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

/// Result type alias for startup paths
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{RepositoryOperation, UniqueViolation};
    use serde_json::json;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::ProductNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::EmailExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::ProductNameExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::DuplicateEntry.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::Validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ErrorCode::Unknown.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_codes_serialize_as_stable_strings() {
        assert_eq!(
            serde_json::to_value(ErrorCode::ProductNameExists).unwrap(),
            json!("ERR_PRODUCT_NAME_EXISTS")
        );
        assert_eq!(
            serde_json::to_value(DetailCode::LengthTooLong).unwrap(),
            json!("LENGTH_TOO_LONG")
        );
        assert_eq!(DetailCode::IsRequired.to_string(), "IS_REQUIRED");
    }

    #[test]
    fn test_display_includes_cause() {
        let plain = AppError::new(ErrorCode::ProductNotFound, "product not found");
        assert_eq!(plain.to_string(), "[ERR_PRODUCT_NOT_FOUND] product not found");

        let wrapped = AppError::internal(std::io::Error::other("disk gone"));
        assert_eq!(
            wrapped.to_string(),
            "[ERR_INTERNAL] an internal error occurred: disk gone"
        );
    }

    #[test]
    fn test_unique_violation_becomes_duplicate_entry() {
        let mut repo_err = RepositoryError::new(
            RepositoryOperation::Save,
            RepositoryErrorKind::UniqueViolation,
            "An entry with this name already exists.",
        );
        repo_err.unique = Some(UniqueViolation::parse(
            Some("products_name_unique"),
            Some("Key (name)=(Umrah) already exists."),
        ));

        let err = AppError::from(repo_err);
        assert_eq!(err.code, ErrorCode::DuplicateEntry);
        assert_eq!(err.details.unwrap()["name"], json!("Umrah"));
    }

    #[test]
    fn test_storage_errors_are_internal() {
        let err = AppError::from(RepositoryError::connection(
            RepositoryOperation::Count,
            "pool timed out",
        ));
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(err.source.is_some());
    }

    #[tokio::test]
    async fn test_into_response_renders_envelope() {
        let err = AppError::validation(Details::from_iter([(
            "name".to_string(),
            json!(DetailCode::IsRequired),
        )]));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body,
            json!({
                "status": "error",
                "error": {
                    "code": "ERR_VALIDATION",
                    "message": VALIDATION_MESSAGE,
                    "details": { "name": "IS_REQUIRED" }
                }
            })
        );
    }

    #[tokio::test]
    async fn test_internal_cause_is_not_serialized() {
        let response = AppError::internal(std::io::Error::other("secret dsn")).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("secret dsn"));
        assert!(text.contains("ERR_INTERNAL"));
    }
}
