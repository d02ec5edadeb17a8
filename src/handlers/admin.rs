//! Admin page handlers: login, index, and list/add/edit/delete for any registered model.
//!
//! Model routes resolve the model first (unknown -> `/admin`), then check the session,
//! then run one adapter operation and render or redirect.

use crate::error::AppError;
use crate::extractors::AdminIdentity;
use crate::model::ModelDescriptor;
use crate::render::{page, FORM_TEMPLATE, INDEX_TEMPLATE, LIST_TEMPLATE, LOGIN_TEMPLATE};
use crate::service::{ModelAdapter, Record};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub offset: Option<u32>,
    pub limit: Option<u32>,
}

fn resolve_model(state: &AppState, name: &str) -> Result<Arc<ModelDescriptor>, AppError> {
    state
        .registry
        .snapshot()
        .get(name)
        .ok_or_else(|| AppError::UnknownModel(name.to_string()))
}

fn list_url(model: &ModelDescriptor) -> String {
    format!("/admin/model/{}", model.name)
}

async fn fetch_instance(
    state: &AppState,
    model: &ModelDescriptor,
    raw_key: &str,
) -> Result<Record, AppError> {
    let key = model.primary_key().coerce_path(raw_key)?;
    ModelAdapter::get_by_key(&state.pool, model, &key)
        .await?
        .ok_or_else(|| AppError::RecordNotFound {
            model: model.name.clone(),
        })
}

fn form_values(form: HashMap<String, String>) -> Map<String, Value> {
    form.into_iter().map(|(k, v)| (k, Value::String(v))).collect()
}

fn form_context(
    model: &ModelDescriptor,
    action: &str,
    values: Map<String, Value>,
    error: Option<String>,
) -> Value {
    let adding = action == "add";
    let fields: Vec<Value> = model
        .fields
        .iter()
        .filter(|f| if adding { !f.is_generated_key() } else { !f.is_primary_key })
        .map(|f| {
            json!({
                "name": f.name,
                "kind": f.kind,
                "nullable": f.nullable,
                "sensitive": f.sensitive,
            })
        })
        .collect();
    json!({
        "model_name": model.name,
        "action": action,
        "fields": fields,
        "values": values,
        "error": error,
    })
}

/// Hash non-blank sensitive values so secrets typed into a form are never stored as entered.
fn hash_sensitive(state: &AppState, model: &ModelDescriptor, submitted: &mut Map<String, Value>) {
    for (name, value) in submitted.iter_mut() {
        let sensitive = model.field(name).map(|f| f.sensitive).unwrap_or(false);
        let hashed = match value {
            Value::String(raw) if sensitive && !raw.is_empty() => state.auth.hasher().hash(raw),
            _ => continue,
        };
        *value = Value::String(hashed);
    }
}

/// Echo submitted values back onto a failed form, minus sensitive ones.
fn echo_values(model: &ModelDescriptor, submitted: &Map<String, Value>) -> Map<String, Value> {
    submitted
        .iter()
        .filter(|(k, _)| model.field(k).map(|f| !f.sensitive).unwrap_or(false))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn form_error_page(
    state: &AppState,
    model: &ModelDescriptor,
    action: &str,
    submitted: &Map<String, Value>,
    err: AppError,
) -> Result<Response, AppError> {
    if !err.is_form_error() {
        return Err(err);
    }
    tracing::info!(model = %model.name, error = %err, "form rejected");
    let ctx = form_context(model, action, echo_values(model, submitted), Some(err.to_string()));
    page(
        state.renderer.as_ref(),
        StatusCode::UNPROCESSABLE_ENTITY,
        FORM_TEMPLATE,
        &ctx,
    )
}

pub async fn login_page(State(state): State<AppState>) -> Result<Response, AppError> {
    page(
        state.renderer.as_ref(),
        StatusCode::OK,
        LOGIN_TEMPLATE,
        &json!({ "error": null }),
    )
}

pub async fn login_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    match state.auth.login(&form.username, &form.password).await {
        Ok(identity) => {
            let jar = state.auth.start_session(jar, &identity);
            Ok((jar, Redirect::to("/admin")).into_response())
        }
        Err(AppError::AuthFailure) => page(
            state.renderer.as_ref(),
            StatusCode::OK,
            LOGIN_TEMPLATE,
            &json!({ "error": "Invalid credentials" }),
        ),
        Err(e) => Err(e),
    }
}

pub async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> impl IntoResponse {
    (state.auth.end_session(jar), Redirect::to("/admin/login"))
}

pub async fn index(
    State(state): State<AppState>,
    AdminIdentity(user): AdminIdentity,
) -> Result<Response, AppError> {
    let models = state.registry.snapshot().names();
    page(
        state.renderer.as_ref(),
        StatusCode::OK,
        INDEX_TEMPLATE,
        &json!({ "models": models, "user": user }),
    )
}

pub async fn model_list(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(name): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Response, AppError> {
    let model = resolve_model(&state, &name)?;
    state.auth.require_superuser(&jar).await?;
    let limit = params.limit.unwrap_or(state.config.page_size);
    let offset = params.offset.unwrap_or(0);
    let records = ModelAdapter::list(&state.pool, &model, Some(offset), Some(limit)).await?;
    let items: Vec<Map<String, Value>> = records.iter().map(|r| r.public_view(&model)).collect();
    let fields: Vec<&str> = model
        .fields
        .iter()
        .filter(|f| !f.sensitive)
        .map(|f| f.name.as_str())
        .collect();
    page(
        state.renderer.as_ref(),
        StatusCode::OK,
        LIST_TEMPLATE,
        &json!({
            "model_name": model.name,
            "primary_key": model.primary_key().name,
            "fields": fields,
            "items": items,
            "count": items.len(),
            "offset": offset,
            "limit": limit,
        }),
    )
}

pub async fn add_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let model = resolve_model(&state, &name)?;
    state.auth.require_superuser(&jar).await?;
    page(
        state.renderer.as_ref(),
        StatusCode::OK,
        FORM_TEMPLATE,
        &form_context(&model, "add", Map::new(), None),
    )
}

pub async fn add_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path(name): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let model = resolve_model(&state, &name)?;
    state.auth.require_superuser(&jar).await?;
    let mut submitted = form_values(form);
    hash_sensitive(&state, &model, &mut submitted);
    match ModelAdapter::create(&state.pool, &model, &submitted).await {
        Ok(record) => {
            tracing::info!(model = %model.name, key = %record.key(&model), "record created");
            Ok(Redirect::to(&list_url(&model)).into_response())
        }
        Err(e) => form_error_page(&state, &model, "add", &submitted, e),
    }
}

pub async fn edit_page(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path((name, pk)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let model = resolve_model(&state, &name)?;
    state.auth.require_superuser(&jar).await?;
    let instance = fetch_instance(&state, &model, &pk).await?;
    page(
        state.renderer.as_ref(),
        StatusCode::OK,
        FORM_TEMPLATE,
        &form_context(&model, "edit", instance.public_view(&model), None),
    )
}

pub async fn edit_submit(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path((name, pk)): Path<(String, String)>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<Response, AppError> {
    let model = resolve_model(&state, &name)?;
    state.auth.require_superuser(&jar).await?;
    let instance = fetch_instance(&state, &model, &pk).await?;
    let mut submitted = form_values(form);
    // Sensitive values are never shown on the form; blank means unchanged.
    submitted.retain(|k, v| {
        let blank = v.as_str().map(str::is_empty).unwrap_or(false);
        !(blank && model.field(k).map(|f| f.sensitive).unwrap_or(false))
    });
    hash_sensitive(&state, &model, &mut submitted);
    match ModelAdapter::update(&state.pool, &model, &instance, &submitted).await {
        Ok(_) => {
            tracing::info!(model = %model.name, key = %instance.key(&model), "record updated");
            Ok(Redirect::to(&list_url(&model)).into_response())
        }
        Err(e) => form_error_page(&state, &model, "edit", &submitted, e),
    }
}

pub async fn delete(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Path((name, pk)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let model = resolve_model(&state, &name)?;
    state.auth.require_superuser(&jar).await?;
    let instance = fetch_instance(&state, &model, &pk).await?;
    ModelAdapter::delete(&state.pool, &model, &instance).await?;
    tracing::info!(model = %model.name, key = %instance.key(&model), "record deleted");
    Ok(Redirect::to(&list_url(&model)).into_response())
}
