//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! bookstore-cli user create -e reader@example.com -n "Reader" -p 'Str0ngPass!' -r USER
//! bookstore-cli user promote -e reader@example.com
//! ```

use bookstore_api::db::{RepositoryError, UserRepository};
use bookstore_api::services::auth::{AuthError, hash_password, validate_password};
use bookstore_core::{Email, UserRole};

use super::{CommandError, connect};

fn parse_role(raw: &str) -> Result<UserRole, CommandError> {
    raw.trim()
        .to_ascii_uppercase()
        .parse()
        .map_err(|_| CommandError::InvalidRole(raw.to_owned()))
}

/// Create a user with the given role.
pub async fn create(
    email: &str,
    name: &str,
    password: &str,
    role: &str,
) -> Result<(), CommandError> {
    let role = parse_role(role)?;
    let email = Email::parse(email).map_err(AuthError::from)?;
    validate_password(password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;

    tracing::info!("Creating user: {} ({})", email, role);
    let user = UserRepository::new(&pool)
        .create(name.trim(), &email, &password_hash, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CommandError::UserExists(email.to_string()),
            other => other.into(),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Give an existing user the `ADMIN` role.
pub async fn promote(email: &str) -> Result<(), CommandError> {
    let parsed = Email::parse(email).map_err(AuthError::from)?;
    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    let user = users
        .get_by_email(&parsed)
        .await?
        .ok_or_else(|| CommandError::UserNotFound(email.to_owned()))?;

    if user.role.is_admin() {
        tracing::info!("{} is already an admin", user.email);
        return Ok(());
    }

    let user = users.set_role(user.id, UserRole::Admin).await?;
    tracing::info!("Promoted {} (ID {}) to {}", user.email, user.id, user.role);
    Ok(())
}
