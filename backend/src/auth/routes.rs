//! Defines the HTTP routes specifically for authentication.
//!
//! These routes handle local login, Google login and logout. They are
//! merged into the main router at the root path.

use axum::routing::post;
use axum::Router;

use super::handlers::{google_login, login, logout};
use crate::state::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/google", post(google_login))
}
