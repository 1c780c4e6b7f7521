//! Handler functions for staff account endpoints.

use axum::extract::State;
use axum::Json;
use reparo_adapters::{IdentityStore, UserSummary};

use crate::auth::{AuthUser, SessionUser};
use crate::errors::AppResult;
use crate::state::AppState;

pub async fn me(AuthUser(user): AuthUser) -> Json<SessionUser> {
    Json(user)
}

/// Staff accounts without their password hashes.
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<UserSummary>>> {
    Ok(Json(state.storage.list_users().await?))
}
