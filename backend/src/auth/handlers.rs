//! Handler functions for authentication-related API endpoints.
//!
//! These functions parse the login payloads, delegate to
//! [`AuthService`](super::service::AuthService) and set or clear the signed
//! session cookie.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use axum_extra::extract::cookie::SignedCookieJar;
use serde_json::{json, Value};

use super::middleware::{expired_session_cookie, session_cookie};
use super::models::{AuthResponse, GoogleLoginRequest, LoginRequest, SessionUser};
use super::session::SESSION_COOKIE;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

const MISSING_CREDENTIALS: &str = "Usuário e senha são obrigatórios";
const MISSING_ID_TOKEN: &str = "id_token é obrigatório";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn signed_in(
    state: &AppState,
    jar: SignedCookieJar,
    user: SessionUser,
    token: String,
) -> (SignedCookieJar, Json<AuthResponse>) {
    let ttl = state.auth.sessions().ttl().as_secs();
    let jar = jar.add(session_cookie(token, ttl, state.secure_cookies));
    (jar, Json(AuthResponse { ok: true, user }))
}

pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(SignedCookieJar, Json<AuthResponse>)> {
    let Json(body) = body.map_err(|_| AppError::Validation(MISSING_CREDENTIALS.into()))?;
    let (Some(username), Some(password)) = (non_empty(body.username), non_empty(body.password))
    else {
        return Err(AppError::Validation(MISSING_CREDENTIALS.into()));
    };

    let (user, token) = state.auth.login(username.trim(), &password).await?;
    tracing::info!(user = %user.username, "Staff logged in");
    Ok(signed_in(&state, jar, user, token))
}

pub async fn google_login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    body: Result<Json<GoogleLoginRequest>, JsonRejection>,
) -> AppResult<(SignedCookieJar, Json<AuthResponse>)> {
    let Json(body) = body.map_err(|_| AppError::Validation(MISSING_ID_TOKEN.into()))?;
    let id_token = non_empty(body.id_token)
        .ok_or_else(|| AppError::Validation(MISSING_ID_TOKEN.into()))?;

    let (user, token) = state.auth.login_with_id_token(id_token.trim()).await?;
    tracing::info!(user = %user.username, "Staff logged in with Google");
    Ok(signed_in(&state, jar, user, token))
}

/// Always succeeds, with or without a live session.
pub async fn logout(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> (SignedCookieJar, Json<Value>) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if state.auth.logout(cookie.value()) {
            tracing::info!("Session closed");
        }
    }
    (jar.remove(expired_session_cookie()), Json(json!({ "ok": true })))
}
