//! Session authenticator: credential check, per-request identity, superuser gate.
//!
//! The session transport is an encrypted private cookie holding only the user id.

use crate::auth::hasher::PasswordHasher;
use crate::auth::user::{Identity, UserStore};
use crate::error::AppError;
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use std::sync::Arc;

/// The single session entry the admin reads and writes.
pub const SESSION_USER_KEY: &str = "admin_user_id";

#[derive(Clone)]
pub struct Authenticator {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_hash: String,
    insecure_cookie: bool,
}

impl Authenticator {
    pub fn new(users: Arc<dyn UserStore>, hasher: Arc<dyn PasswordHasher>) -> Self {
        let dummy_hash = hasher.hash("autoadmin-dummy-secret");
        Authenticator {
            users,
            hasher,
            dummy_hash,
            insecure_cookie: false,
        }
    }

    /// Drop the `Secure` flag on the session cookie (plain-HTTP development only).
    pub fn with_insecure_cookie(mut self, insecure: bool) -> Self {
        self.insecure_cookie = insecure;
        self
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub fn hasher(&self) -> &Arc<dyn PasswordHasher> {
        &self.hasher
    }

    /// Verify a username-or-email and secret. Every failure is the same `AuthFailure`.
    pub async fn login(&self, credential: &str, secret: &str) -> Result<Identity, AppError> {
        let credential = credential.trim();
        let Some(user) = self.users.find_by_login(credential).await? else {
            self.hasher.verify(secret, &self.dummy_hash);
            tracing::info!("login rejected");
            return Err(AppError::AuthFailure);
        };
        let verified = self.hasher.verify(secret, user.hashed_secret());
        if !verified || !user.is_active() {
            tracing::info!("login rejected");
            return Err(AppError::AuthFailure);
        }
        tracing::info!(user_id = user.id(), "login accepted");
        Ok(Identity::from_user(user.as_ref()))
    }

    /// Identity of the live user behind the session, if any. Inactive users resolve to none.
    pub async fn current_identity(
        &self,
        jar: &PrivateCookieJar,
    ) -> Result<Option<Identity>, AppError> {
        let Some(id) = session_user_id(jar) else {
            return Ok(None);
        };
        let user = self.users.find_by_id(id).await?;
        Ok(user
            .filter(|u| u.is_active())
            .map(|u| Identity::from_user(u.as_ref())))
    }

    /// Gate for every admin and API route except login.
    pub async fn require_superuser(&self, jar: &PrivateCookieJar) -> Result<Identity, AppError> {
        match self.current_identity(jar).await? {
            Some(identity) if identity.is_superuser => Ok(identity),
            Some(identity) => {
                tracing::debug!(user_id = identity.id, "non-superuser denied");
                Err(AppError::NotAuthorized)
            }
            None => Err(AppError::NotAuthenticated),
        }
    }

    pub fn start_session(&self, jar: PrivateCookieJar, identity: &Identity) -> PrivateCookieJar {
        jar.add(
            Cookie::build(Cookie::new(SESSION_USER_KEY, identity.id.to_string()))
                .path("/")
                .http_only(true)
                .secure(!self.insecure_cookie)
                .same_site(SameSite::Lax)
                .build(),
        )
    }

    pub fn end_session(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build(Cookie::new(SESSION_USER_KEY, "")).path("/").build())
    }
}

fn session_user_id(jar: &PrivateCookieJar) -> Option<i64> {
    jar.get(SESSION_USER_KEY)
        .and_then(|c| c.value().parse::<i64>().ok())
}
