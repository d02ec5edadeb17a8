//! Read-only JSON API over the registry.

use crate::error::{ApiError, AppError};
use crate::extractors::ApiIdentity;
use crate::handlers::admin::PageParams;
use crate::response::{listing, Listing};
use crate::service::ModelAdapter;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub primary_key: String,
    pub fields: Vec<FieldSummary>,
}

/// Registered names plus a per-model summary.
#[derive(Serialize)]
pub struct ModelIndex {
    pub models: Vec<String>,
    #[serde(flatten)]
    pub summaries: Listing<ModelSummary>,
}

#[derive(Serialize)]
pub struct FieldSummary {
    pub name: String,
    pub kind: crate::model::ColumnKind,
    pub nullable: bool,
}

/// GET /api/models
pub async fn models(State(state): State<AppState>, _user: ApiIdentity) -> Json<ModelIndex> {
    let registry = state.registry.snapshot();
    let items: Vec<ModelSummary> = registry
        .list()
        .map(|(name, model)| ModelSummary {
            name: name.to_string(),
            primary_key: model.primary_key().name.clone(),
            fields: model
                .fields
                .iter()
                .filter(|f| !f.sensitive)
                .map(|f| FieldSummary {
                    name: f.name.clone(),
                    kind: f.kind,
                    nullable: f.nullable,
                })
                .collect(),
        })
        .collect();
    Json(ModelIndex {
        models: registry.names(),
        summaries: listing(items),
    })
}

/// GET /api/models/:name
pub async fn model_records(
    State(state): State<AppState>,
    _user: ApiIdentity,
    Path(name): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Listing<Map<String, Value>>>, ApiError> {
    let model = state
        .registry
        .snapshot()
        .get(&name)
        .ok_or(AppError::UnknownModel(name))?;
    let records = ModelAdapter::list(&state.pool, &model, params.offset, params.limit).await?;
    let items: Vec<Map<String, Value>> = records.iter().map(|r| r.public_view(&model)).collect();
    Ok(Json(listing(items)))
}
