//! Handler functions for the service-request API.
//!
//! These functions parse path ids and JSON bodies, call into
//! `services::request_manager` and shape the `{ok, request}` responses the
//! dashboard expects.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use reparo_adapters::ServiceRequest;
use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::errors::{AppError, AppResult};
use crate::services::CreateRequestPayload;
use crate::state::AppState;

const INVALID_BODY: &str = "Corpo da requisição inválido";

#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub ok: bool,
    pub request: ServiceRequest,
}

impl From<ServiceRequest> for RequestResponse {
    fn from(request: ServiceRequest) -> Self {
        Self { ok: true, request }
    }
}

/// Ids are integers; anything else cannot name a stored row.
fn parse_id(raw: &str) -> AppResult<i64> {
    raw.trim().parse().map_err(|_| AppError::NotFound)
}

pub async fn create_request(
    State(state): State<AppState>,
    body: Result<Json<CreateRequestPayload>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ServiceRequest>)> {
    let Json(payload) = body.map_err(|_| AppError::Validation(INVALID_BODY.into()))?;
    let request = state.requests.create(payload).await?;
    tracing::info!(request_id = request.id, "Service request created");
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn list_requests(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> AppResult<Json<Vec<ServiceRequest>>> {
    Ok(Json(state.requests.list().await?))
}

pub async fn complete_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<RequestResponse>> {
    let id = parse_id(&id)?;
    let request = state.requests.complete(id).await?;
    tracing::info!(request_id = id, user = %user.username, "Service request completed");
    Ok(Json(request.into()))
}

pub async fn update_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<RequestResponse>> {
    let id = parse_id(&id)?;
    let Json(body) = body.map_err(|_| AppError::Validation(INVALID_BODY.into()))?;
    let fields = body
        .as_object()
        .ok_or_else(|| AppError::Validation(INVALID_BODY.into()))?;

    let request = state.requests.update(id, fields).await?;
    tracing::info!(request_id = id, user = %user.username, "Service request updated");
    Ok(Json(request.into()))
}

pub async fn delete_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Value>> {
    let id = parse_id(&id)?;
    state.requests.delete(id).await?;
    tracing::info!(request_id = id, user = %user.username, "Service request deleted");
    Ok(Json(json!({ "ok": true })))
}
