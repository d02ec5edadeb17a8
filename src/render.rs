//! Page rendering behind a trait. The default renderer emits JSON so the admin works headless.

use crate::error::AppError;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

pub const LOGIN_TEMPLATE: &str = "login.html";
pub const INDEX_TEMPLATE: &str = "admin_index.html";
pub const LIST_TEMPLATE: &str = "admin_list.html";
pub const FORM_TEMPLATE: &str = "admin_form.html";

pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError>;

    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

/// Writes `{"template": .., "context": ..}`.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, AppError> {
        serde_json::to_string(&json!({ "template": template, "context": context }))
            .map_err(|e| AppError::Render(e.to_string()))
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// Render `template` into a response with the renderer's content type.
pub fn page(
    renderer: &dyn Renderer,
    status: StatusCode,
    template: &str,
    context: &Value,
) -> Result<Response, AppError> {
    let body = renderer.render(template, context)?;
    Ok((status, [(header::CONTENT_TYPE, renderer.content_type())], body).into_response())
}
