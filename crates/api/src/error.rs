//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors render as the standard
//! envelope:
//!
//! ```json
//! { "timestamp": "...", "path": "/books/9", "status": 404,
//!   "code": "RESOURCE_NOT_FOUND", "message": "Book 9 not found" }
//! ```
//!
//! `path` is filled in by [`crate::middleware::error_envelope_middleware`],
//! which also wraps bare error responses produced outside the handlers
//! (rate limiter, method-not-allowed).

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Machine-readable error codes carried in the `code` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    ValidationFailed,
    InvalidQueryParam,
    Unauthorized,
    TokenExpired,
    InvalidToken,
    Forbidden,
    UserNotFound,
    ResourceNotFound,
    BookNotFound,
    ReviewNotFound,
    CartItemNotFound,
    WishlistItemNotFound,
    OrderNotFound,
    MethodNotAllowed,
    DuplicateResource,
    DuplicateReview,
    StateConflict,
    CartEmpty,
    CartInvalidQuantity,
    InvalidOrderStatus,
    TooManyRequests,
    InternalServerError,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::InvalidQueryParam => "INVALID_QUERY_PARAM",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::Forbidden => "FORBIDDEN",
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::BookNotFound => "BOOK_NOT_FOUND",
            Self::ReviewNotFound => "REVIEW_NOT_FOUND",
            Self::CartItemNotFound => "CART_ITEM_NOT_FOUND",
            Self::WishlistItemNotFound => "WISHLIST_ITEM_NOT_FOUND",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::DuplicateResource => "DUPLICATE_RESOURCE",
            Self::DuplicateReview => "DUPLICATE_REVIEW",
            Self::StateConflict => "STATE_CONFLICT",
            Self::CartEmpty => "CART_EMPTY",
            Self::CartInvalidQuantity => "CART_INVALID_QUANTITY",
            Self::InvalidOrderStatus => "INVALID_ORDER_STATUS",
            Self::TooManyRequests => "TOO_MANY_REQUESTS",
            Self::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Default code for an error status that carries no envelope of its own.
    #[must_use]
    pub const fn for_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::ResourceNotFound,
            405 => Self::MethodNotAllowed,
            429 => Self::TooManyRequests,
            400..=499 => Self::BadRequest,
            _ => Self::InternalServerError,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The JSON error body.
///
/// A copy is stored in the response extensions so middleware can attach the
/// request path after the handler has run.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    pub timestamp: DateTime<Utc>,
    pub path: Option<String>,
    pub status: u16,
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    #[must_use]
    pub fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            path: None,
            status: status.as_u16(),
            code,
            message: message.into(),
            details: None,
        }
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(&self)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Request body is missing fields or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Query string could not be parsed.
    #[error("Invalid query parameter: {0}")]
    InvalidQuery(String),

    /// Domain-specific bad request (e.g. `CART_EMPTY`).
    #[error("Bad request ({code}): {message}")]
    BadRequest { code: ErrorCode, message: String },

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found ({code}): {message}")]
    NotFound {
        code: ErrorCode,
        message: String,
        details: Option<Value>,
    },

    /// Request conflicts with current state.
    #[error("Conflict ({code}): {message}")]
    Conflict { code: ErrorCode, message: String },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Attach `details` to a not-found error. Other variants are unchanged.
    #[must_use]
    pub fn with_details(self, value: Value) -> Self {
        match self {
            Self::NotFound { code, message, .. } => Self::NotFound {
                code,
                message,
                details: Some(value),
            },
            other => other,
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Internal(_) => true,
            Self::Database(err) => !matches!(
                err,
                RepositoryError::NotFound | RepositoryError::Conflict(_)
            ),
            Self::Auth(err) => matches!(
                err,
                AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenEncoding(_)
            ),
            _ => false,
        }
    }

    /// Status, code and client-facing message.
    ///
    /// Internal details are never exposed to clients.
    fn parts(&self) -> (StatusCode, ErrorCode, String) {
        if self.is_server_error() {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Internal server error".to_string(),
            );
        }

        match self {
            Self::Database(RepositoryError::NotFound) => (
                StatusCode::NOT_FOUND,
                ErrorCode::ResourceNotFound,
                "Resource not found".to_string(),
            ),
            Self::Database(RepositoryError::Conflict(msg)) => {
                (StatusCode::CONFLICT, ErrorCode::StateConflict, msg.clone())
            }
            Self::Auth(err) => auth_parts(err),
            Self::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::ValidationFailed,
                msg.clone(),
            ),
            Self::InvalidQuery(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorCode::InvalidQueryParam,
                msg.clone(),
            ),
            Self::BadRequest { code, message } => (StatusCode::BAD_REQUEST, *code, message.clone()),
            Self::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::Unauthorized, msg.clone())
            }
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, ErrorCode::Forbidden, msg.clone()),
            Self::NotFound { code, message, .. } => (StatusCode::NOT_FOUND, *code, message.clone()),
            Self::Conflict { code, message } => (StatusCode::CONFLICT, *code, message.clone()),
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalServerError,
                "Internal server error".to_string(),
            ),
        }
    }
}

fn auth_parts(err: &AuthError) -> (StatusCode, ErrorCode, String) {
    match err {
        AuthError::InvalidEmail(e) => (
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            format!("Invalid email: {e}"),
        ),
        AuthError::WeakPassword(msg) => (
            StatusCode::BAD_REQUEST,
            ErrorCode::ValidationFailed,
            msg.clone(),
        ),
        AuthError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Invalid email or password".to_string(),
        ),
        AuthError::MissingToken => (
            StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized,
            "Missing Authorization Header".to_string(),
        ),
        AuthError::TokenExpired => (
            StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired,
            "Token has expired".to_string(),
        ),
        AuthError::InvalidToken(_) | AuthError::WrongTokenType { .. } => (
            StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken,
            err.to_string(),
        ),
        AuthError::UserNotFound => (
            StatusCode::NOT_FOUND,
            ErrorCode::UserNotFound,
            "User not found".to_string(),
        ),
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            ErrorCode::DuplicateResource,
            "Email already registered".to_string(),
        ),
        AuthError::Deactivated => (
            StatusCode::FORBIDDEN,
            ErrorCode::Forbidden,
            "User is deactivated".to_string(),
        ),
        AuthError::Repository(_) | AuthError::PasswordHash | AuthError::TokenEncoding(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalServerError,
            "Internal server error".to_string(),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, code, message) = self.parts();
        let mut envelope = ErrorEnvelope::new(status, code, message);
        if let Self::NotFound {
            details: Some(details),
            ..
        } = self
        {
            envelope.details = Some(details);
        }

        envelope.into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidQuery(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(_) => {
                Self::not_found(ErrorCode::ResourceNotFound, "Resource not found")
            }
            other => Self::Internal(other.body_text()),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    fn envelope_of(err: AppError) -> ErrorEnvelope {
        err.into_response()
            .extensions()
            .get::<ErrorEnvelope>()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::not_found(ErrorCode::BookNotFound, "Book not found");
        assert_eq!(err.to_string(), "Not found (BOOK_NOT_FOUND): Book not found");

        let err = AppError::Validation("rating is required".to_string());
        assert_eq!(err.to_string(), "Validation failed: rating is required");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::InvalidQuery("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::not_found(ErrorCode::OrderNotFound, "x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::conflict(ErrorCode::StateConflict, "x")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        let env = envelope_of(AppError::Auth(AuthError::InvalidCredentials));
        assert_eq!(env.status, 401);
        assert_eq!(env.code, ErrorCode::Unauthorized);
        assert_eq!(env.message, "Invalid email or password");

        let env = envelope_of(AppError::Auth(AuthError::UserAlreadyExists));
        assert_eq!(env.status, 409);
        assert_eq!(env.code, ErrorCode::DuplicateResource);

        let env = envelope_of(AppError::Auth(AuthError::TokenExpired));
        assert_eq!(env.code, ErrorCode::TokenExpired);

        let env = envelope_of(AppError::Auth(AuthError::Deactivated));
        assert_eq!(env.status, 403);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let env = envelope_of(AppError::Internal("connection string leaked".to_string()));
        assert_eq!(env.message, "Internal server error");
        assert_eq!(env.code, ErrorCode::InternalServerError);

        let env = envelope_of(AppError::Database(RepositoryError::DataCorruption(
            "bad row".to_string(),
        )));
        assert_eq!(env.status, 500);
        assert_eq!(env.message, "Internal server error");
    }

    #[test]
    fn test_repository_not_found_and_conflict() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        let env = envelope_of(AppError::Database(RepositoryError::Conflict(
            "book is referenced by orders".to_string(),
        )));
        assert_eq!(env.status, 409);
        assert_eq!(env.code, ErrorCode::StateConflict);
        assert_eq!(env.message, "book is referenced by orders");
    }

    #[test]
    fn test_details_only_on_not_found() {
        let env = envelope_of(
            AppError::not_found(ErrorCode::BookNotFound, "Book not found")
                .with_details(serde_json::json!({ "book_id": 99 })),
        );
        assert_eq!(env.details.unwrap()["book_id"], 99);

        let env = envelope_of(AppError::Forbidden("no".to_string()).with_details(serde_json::json!({})));
        assert!(env.details.is_none());
    }

    #[test]
    fn test_envelope_serialization() {
        let env = ErrorEnvelope::new(StatusCode::BAD_REQUEST, ErrorCode::CartEmpty, "Cart is empty");
        let value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["status"], 400);
        assert_eq!(value["code"], "CART_EMPTY");
        assert_eq!(value["message"], "Cart is empty");
        assert!(value["path"].is_null());
        assert!(value.get("details").is_none());
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_code_for_status() {
        assert_eq!(
            ErrorCode::for_status(StatusCode::TOO_MANY_REQUESTS),
            ErrorCode::TooManyRequests
        );
        assert_eq!(
            ErrorCode::for_status(StatusCode::METHOD_NOT_ALLOWED),
            ErrorCode::MethodNotAllowed
        );
        assert_eq!(
            ErrorCode::for_status(StatusCode::PAYLOAD_TOO_LARGE),
            ErrorCode::BadRequest
        );
        assert_eq!(
            ErrorCode::for_status(StatusCode::BAD_GATEWAY),
            ErrorCode::InternalServerError
        );
    }

    #[test]
    fn test_code_as_str_matches_serde() {
        for code in [ErrorCode::WishlistItemNotFound, ErrorCode::InvalidOrderStatus] {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, code.as_str());
        }
    }
}
