//! Defines the HTTP routes for service requests.

use axum::routing::{patch, post};
use axum::Router;

use super::handlers::{complete_request, create_request, delete_request, list_requests, update_request};
use crate::state::AppState;

pub fn requests_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_request).get(list_requests))
        .route("/{id}", patch(update_request).delete(delete_request))
        .route("/{id}/complete", post(complete_request))
}
