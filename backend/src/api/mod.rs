//! Central module for organizing the application's API endpoints.
//!
//! This module groups the service-request, catalogue and staff routes under
//! `/api`, and the liveness probe. Login and logout live in `auth`.

pub mod catalog;
pub mod requests;
pub mod user;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::errors::AppResult;
use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/services", get(catalog::list_services))
        .nest("/requests", requests::requests_router())
        .route("/users", get(user::handlers::list_users))
        .route("/me", get(user::handlers::me))
}

/// Liveness probe; fails when the storage backend does.
pub async fn healthz(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.storage.health_check().await?;
    Ok(Json(json!({ "ok": true, "backend": state.storage.backend_name() })))
}
