//! One-shot creation of the first superuser.

use crate::auth::{Identity, NewUser, PasswordHasher, UserStore};
use crate::error::{AppError, BootstrapError};

/// Create an active superuser. Refuses empty or mismatched secrets and any existing
/// user holding the same username or email.
pub async fn create_superuser(
    users: &dyn UserStore,
    hasher: &dyn PasswordHasher,
    username: &str,
    email: &str,
    secret: &str,
    confirmation: &str,
) -> Result<Identity, BootstrapError> {
    if secret.is_empty() {
        return Err(BootstrapError::EmptySecret);
    }
    if secret != confirmation {
        return Err(BootstrapError::SecretMismatch);
    }
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() || email.is_empty() {
        return Err(AppError::BadRequest("username and email are required".into()).into());
    }
    if users.find_by_login(username).await?.is_some()
        || users.find_by_login(email).await?.is_some()
    {
        return Err(BootstrapError::UserExists);
    }

    let created = users
        .create(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            hashed_secret: hasher.hash(secret),
            is_superuser: true,
        })
        .await
        .map_err(|e| match e {
            AppError::ConstraintViolation(_) => BootstrapError::UserExists,
            other => BootstrapError::App(other),
        })?;
    tracing::info!(user_id = created.id(), username = %username, "superuser created");
    Ok(Identity::from_user(created.as_ref()))
}
