//! Signup, login, and token refresh.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::UserId;

use super::required;
use super::users::check_name_length;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::extract::ApiJson;
use crate::middleware::RequireRefresh;
use crate::services::auth::AuthService;
use crate::state::AppState;

const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    user_id: UserId,
    email: String,
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    access_token: String,
    refresh_token: String,
    token_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    access_token: String,
    token_type: &'static str,
}

/// Passwords are taken verbatim, never trimmed.
fn required_password(value: Option<String>) -> Result<String> {
    value
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::Validation("password is required".to_string()))
}

/// Register a new account.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>)> {
    let name = check_name_length(required(body.name, "name")?)?;
    let email = required(body.email, "email")?;
    let password = required_password(body.password)?;

    let user = AuthService::new(state.pool(), state.keys())
        .signup(&name, &email, &password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            email: user.email.into_inner(),
            name: user.name,
        }),
    ))
}

/// Exchange credentials for an access/refresh token pair.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let email = required(body.email, "email")?;
    let password = required_password(body.password)?;

    let tokens = AuthService::new(state.pool(), state.keys())
        .login(&email, &password)
        .await?;

    add_breadcrumb("auth", "User logged in", None);

    Ok(Json(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        token_type: TOKEN_TYPE,
    }))
}

/// Issue a new access token for a refresh token holder.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn refresh(
    State(state): State<AppState>,
    RequireRefresh(caller): RequireRefresh,
) -> Result<Json<RefreshResponse>> {
    let access_token = AuthService::new(state.pool(), state.keys())
        .refresh(&caller)
        .await?;

    Ok(Json(RefreshResponse {
        access_token,
        token_type: TOKEN_TYPE,
    }))
}
