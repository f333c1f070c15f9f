//! Bearer-token authentication extractors.
//!
//! Handlers declare what they need in their signature:
//!
//! ```rust,ignore
//! async fn me(RequireAuth(user): RequireAuth) -> Result<Json<UserView>> { ... }
//! async fn list_users(RequireAdmin(admin): RequireAdmin) -> Result<Json<...>> { ... }
//! ```
//!
//! The role comes from the token. Handlers that must observe deactivation
//! re-read the user row.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, TokenType};
use crate::state::AppState;

/// Pull the token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let value = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingToken)?;

    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::MissingToken);
    }

    Ok(token.trim())
}

fn authenticate(
    parts: &Parts,
    state: &AppState,
    expected: TokenType,
) -> Result<CurrentUser, AppError> {
    let token = bearer_token(parts)?;
    let claims = state.keys().verify(token, expected)?;
    let user = claims.current_user()?;

    set_sentry_user(&user.id, Some(&user.email));
    tracing::Span::current().record("user_id", user.id.as_i32());

    Ok(user)
}

/// Extractor that requires a valid access token.
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, TokenType::Access).map(Self)
    }
}

/// Extractor that requires a valid access token with the `ADMIN` role.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state, TokenType::Access)?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin role required".to_string()));
        }

        Ok(Self(user))
    }
}

/// Extractor that requires a valid refresh token.
pub struct RequireRefresh(pub CurrentUser);

impl FromRequestParts<AppState> for RequireRefresh {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, TokenType::Refresh).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/users/me");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc.def.ghi");

        let parts = parts_with(Some("bearer   abc"));
        assert_eq!(bearer_token(&parts).unwrap(), "abc");
    }

    #[test]
    fn test_missing_or_malformed_header() {
        for header in [None, Some("Basic dXNlcjpwYXNz"), Some("Bearer"), Some("Bearer  ")] {
            assert!(matches!(
                bearer_token(&parts_with(header)),
                Err(AuthError::MissingToken)
            ));
        }
    }
}
