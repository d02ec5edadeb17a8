//! Routers per surface, plus the assembled admin application.

pub mod admin;
pub mod api;
pub mod common;

pub use admin::admin_routes;
pub use api::api_routes;
pub use common::{common_routes, common_routes_with_ready};

use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

/// Admin pages, JSON API and health routes under one router with a body size cap.
pub fn admin_router(state: AppState) -> Router {
    let limit = state.config.max_body_bytes;
    Router::new()
        .merge(admin_routes(state.clone()))
        .merge(api_routes(state.clone()))
        .merge(common_routes_with_ready(state))
        .layer(RequestBodyLimitLayer::new(limit))
}
