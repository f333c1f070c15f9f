//! JWT access and refresh tokens.
//!
//! Both kinds are HS256 tokens signed with the same secret. The `typ` claim
//! keeps them apart: a refresh token is never accepted where an access token
//! is expected.

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bookstore_core::{UserId, UserRole};

use super::AuthError;
use crate::config::JwtConfig;
use crate::models::CurrentUser;

/// Which kind of token a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        })
    }
}

/// Claims carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    pub email: String,
    pub role: UserRole,
    pub typ: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    fn new(user: &CurrentUser, typ: TokenType, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            typ,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// The caller these claims identify.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user ID.
    pub fn current_user(&self) -> Result<CurrentUser, AuthError> {
        let id = self
            .sub
            .parse::<i32>()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_owned()))?;

        Ok(CurrentUser {
            id: UserId::new(id),
            email: self.email.clone(),
            role: self.role,
        })
    }
}

/// Signing and verification keys plus token lifetimes.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtKeys {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    /// Issue a short-lived access token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_access(&self, user: &CurrentUser) -> Result<String, AuthError> {
        self.issue(&Claims::new(user, TokenType::Access, self.access_ttl))
    }

    /// Issue a long-lived refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenEncoding` if signing fails.
    pub fn issue_refresh(&self, user: &CurrentUser) -> Result<String, AuthError> {
        self.issue(&Claims::new(user, TokenType::Refresh, self.refresh_ttl))
    }

    fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::TokenEncoding(e.to_string()))
    }

    /// Verify a token's signature, expiry and type.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` if the token has expired,
    /// `AuthError::WrongTokenType` if it is the other kind of token, and
    /// `AuthError::InvalidToken` for anything else.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;

            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(err.to_string()),
            }
        })?;

        if data.claims.typ != expected {
            return Err(AuthError::WrongTokenType {
                expected,
                found: data.claims.typ,
            });
        }

        Ok(data.claims)
    }
}
