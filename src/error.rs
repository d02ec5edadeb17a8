//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use thiserror::Error;

/// Errors raised while discovering entity types. Always recovered inside the scan.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("failed to import module '{path}': {reason}")]
    ImportFailure { path: String, reason: String },
    #[error("failed to classify type '{type_name}': {reason}")]
    Classification { type_name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("not authorized")]
    NotAuthorized,
    #[error("invalid credentials")]
    AuthFailure,
    #[error("record not found in {model}")]
    RecordNotFound { model: String },
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("render: {0}")]
    Render(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

impl AppError {
    /// True for errors that belong on the form the user just submitted.
    pub fn is_form_error(&self) -> bool {
        matches!(
            self,
            AppError::ConstraintViolation(_) | AppError::InvalidValue { .. }
        )
    }

    /// Status and machine code used by the JSON surfaces.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::UnknownModel(_) => (StatusCode::NOT_FOUND, "unknown_model"),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, "not_authenticated"),
            AppError::NotAuthorized => (StatusCode::UNAUTHORIZED, "not_authorized"),
            AppError::AuthFailure => (StatusCode::UNAUTHORIZED, "auth_failure"),
            AppError::RecordNotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::ConstraintViolation(_) => (StatusCode::CONFLICT, "constraint_violation"),
            AppError::InvalidValue { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_value"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "render_error"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        }
    }

    /// JSON rendering, used as-is by the API and as the fallback for the admin surface.
    pub fn into_json_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match &self {
            AppError::Db(e) => {
                tracing::error!(error = %e, "database error");
                "An internal error occurred.".to_string()
            }
            AppError::Render(e) => {
                tracing::error!(error = %e, "render error");
                "An internal error occurred.".to_string()
            }
            other => other.to_string(),
        };
        let body = crate::response::error_body(code, message, None);
        (status, Json(body)).into_response()
    }
}

/// Admin surface mapping: access and lookup failures redirect, never reveal data.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::UnknownModel(name) => {
                tracing::debug!(model = %name, "unknown model, redirecting to index");
                Redirect::to("/admin").into_response()
            }
            AppError::NotAuthenticated | AppError::NotAuthorized => {
                Redirect::to("/admin/login").into_response()
            }
            AppError::RecordNotFound { model } => {
                Redirect::to(&format!("/admin/model/{}", model)).into_response()
            }
            other => other.into_json_response(),
        }
    }
}

/// [`AppError`] on the JSON API: always a JSON body, never a redirect.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl<E: Into<AppError>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.into_json_response()
    }
}

/// Errors from the one-shot superuser bootstrap.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("secrets do not match")]
    SecretMismatch,
    #[error("secret must not be empty")]
    EmptySecret,
    #[error("user already exists (by username or email)")]
    UserExists,
    #[error(transparent)]
    App(#[from] AppError),
}
