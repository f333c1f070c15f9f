//! Authentication error types.

use thiserror::Error;

use super::tokens::TokenType;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] bookstore_core::EmailError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Account has been deactivated by an admin.
    #[error("user is deactivated")]
    Deactivated,

    /// No bearer token on the request.
    #[error("missing authorization header")]
    MissingToken,

    /// Token signature is valid but `exp` has passed.
    #[error("token expired")]
    TokenExpired,

    /// Token is malformed or its signature does not verify.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// A refresh token was used where an access token is required, or vice versa.
    #[error("expected {expected} token, got {found} token")]
    WrongTokenType {
        expected: TokenType,
        found: TokenType,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token could not be signed.
    #[error("token encoding error: {0}")]
    TokenEncoding(String),
}
