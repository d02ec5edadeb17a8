//! JSON API routes.

use crate::handlers::api::{model_records, models};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/models", get(models))
        .route("/api/models/:name", get(model_records))
        .with_state(state)
}
