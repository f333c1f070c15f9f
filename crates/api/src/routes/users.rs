//! Profile and user administration.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{UserId, UserRole};

use super::{PageBody, non_blank, not_found_as, required};
use crate::db::UserRepository;
use crate::error::{AppError, ErrorCode, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::models::{CurrentUser, PageRequest, User};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Longest display name the `users` table accepts.
pub const MAX_NAME_LENGTH: usize = 100;

const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    user_id: UserId,
    email: String,
    name: String,
    role: UserRole,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.into_inner(),
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    size: Option<i64>,
}

/// Reject names that would not fit the column.
pub(super) fn check_name_length(name: String) -> Result<String> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(name)
}

/// Load the caller's account, rejecting deactivated users.
pub(super) async fn load_active_user(state: &AppState, caller: &CurrentUser) -> Result<User> {
    let user = UserRepository::new(state.pool())
        .get_by_id(caller.id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    if !user.is_active {
        return Err(AuthError::Deactivated.into());
    }

    Ok(user)
}

/// The caller's profile.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
) -> Result<Json<UserView>> {
    let user = load_active_user(&state, &caller).await?;
    Ok(Json(user.into()))
}

/// Update the caller's display name.
#[instrument(skip_all, fields(user_id = %caller.id))]
pub async fn update_me(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<Json<UserView>> {
    let name = non_blank(body.name, "name")?
        .map(check_name_length)
        .transpose()?;
    let user = load_active_user(&state, &caller).await?;

    let Some(name) = name else {
        return Ok(Json(user.into()));
    };

    let user = UserRepository::new(state.pool())
        .update_name(user.id, &name)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound, "User not found"))?;

    Ok(Json(user.into()))
}

/// All users, newest first.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<PageBody<UserView>>> {
    let request = PageRequest::new(query.page, query.size, DEFAULT_PAGE_SIZE);
    let page = UserRepository::new(state.pool()).list(request).await?;

    Ok(Json(
        PageBody::new(page, UserView::from).with_sort("created_at,DESC".to_string()),
    ))
}

/// Grant or revoke the admin role.
#[instrument(skip_all, fields(target_user_id = %id))]
pub async fn set_role(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<SetRoleRequest>,
) -> Result<Json<UserView>> {
    let role = required(body.role, "role")?
        .to_ascii_uppercase()
        .parse::<UserRole>()
        .map_err(AppError::Validation)?;

    let user = UserRepository::new(state.pool())
        .set_role(id, role)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound, "User not found"))?;

    tracing::info!(admin_id = %admin.id, %role, "user role changed");
    Ok(Json(user.into()))
}

/// Deactivate an account. The user can no longer log in or refresh tokens.
#[instrument(skip_all, fields(target_user_id = %id))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<UserView>> {
    let user = UserRepository::new(state.pool())
        .deactivate(id)
        .await
        .map_err(not_found_as(ErrorCode::UserNotFound, "User not found"))?;

    tracing::info!(admin_id = %admin.id, "user deactivated");
    Ok(Json(user.into()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_length() {
        assert!(check_name_length("a".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(matches!(
            check_name_length("a".repeat(MAX_NAME_LENGTH + 1)),
            Err(AppError::Validation(_))
        ));
    }
}
