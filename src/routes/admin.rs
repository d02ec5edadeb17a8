//! Admin page routes. Path parameters are the registry name and the primary key.

use crate::handlers::admin::{
    add_page, add_submit, delete, edit_page, edit_submit, index, login_page, login_submit, logout,
    model_list,
};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/admin", get(index))
        .route("/admin/login", get(login_page).post(login_submit))
        .route("/admin/logout", get(logout))
        .route("/admin/model/:name", get(model_list))
        .route("/admin/model/:name/add", get(add_page).post(add_submit))
        .route("/admin/model/:name/edit/:pk", get(edit_page).post(edit_submit))
        .route("/admin/model/:name/delete/:pk", get(delete))
        .with_state(state)
}
