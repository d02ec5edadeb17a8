//! Superuser identity extractors for the admin pages and the JSON API.

use crate::auth::Identity;
use crate::error::{ApiError, AppError};
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Key, PrivateCookieJar};

/// Superuser behind the session cookie. Rejects with a redirect to the login page.
#[derive(Clone, Debug)]
pub struct AdminIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = superuser(parts, state).await?;
        Ok(AdminIdentity(identity))
    }
}

/// Same gate as [`AdminIdentity`], but rejects with a JSON 401.
#[derive(Clone, Debug)]
pub struct ApiIdentity(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for ApiIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let identity = superuser(parts, state).await?;
        Ok(ApiIdentity(identity))
    }
}

async fn superuser(parts: &mut Parts, state: &AppState) -> Result<Identity, AppError> {
    let jar = match PrivateCookieJar::<Key>::from_request_parts(parts, state).await {
        Ok(jar) => jar,
        Err(never) => match never {},
    };
    state.auth.require_superuser(&jar).await
}

