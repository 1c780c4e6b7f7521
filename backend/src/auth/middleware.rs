//! Middleware for protecting authenticated routes.
//!
//! [`AuthUser`] is the extractor every protected handler takes; it resolves
//! the signed session cookie against the session registry and rejects with
//! 401 otherwise. [`dashboard_gate`] sends anonymous browsers requesting the
//! dashboard pages to the login page instead.

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

use super::errors::AuthError;
use super::models::SessionUser;
use super::session::SESSION_COOKIE;
use crate::errors::AppError;
use crate::state::AppState;

pub const LOGIN_PAGE: &str = "/login.html";

/// The authenticated staff member behind the current request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.cookie_key.clone());
        session_user(&jar, state)
            .map(AuthUser)
            .ok_or_else(|| AuthError::Unauthenticated.into())
    }
}

fn session_user(jar: &SignedCookieJar, state: &AppState) -> Option<SessionUser> {
    let token = jar.get(SESSION_COOKIE)?;
    state.auth.current_user(token.value())
}

fn is_dashboard_path(path: &str) -> bool {
    path.starts_with("/dashboard")
}

/// Redirects anonymous requests for `/dashboard*` to the login page.
pub async fn dashboard_gate(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    request: Request,
    next: Next,
) -> Response {
    if is_dashboard_path(request.uri().path()) && session_user(&jar, &state).is_none() {
        tracing::debug!(path = %request.uri().path(), "Anonymous dashboard request redirected");
        return Redirect::to(LOGIN_PAGE).into_response();
    }
    next.run(request).await
}

/// The cookie carrying a freshly issued session token.
pub fn session_cookie(token: String, max_age_secs: u64, secure: bool) -> Cookie<'static> {
    let max_age = time::Duration::seconds(i64::try_from(max_age_secs).unwrap_or(i64::MAX));
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// A removal cookie matching [`session_cookie`]'s path.
pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dashboard_paths_are_gated() {
        assert!(is_dashboard_path("/dashboard.html"));
        assert!(is_dashboard_path("/dashboard"));
        assert!(is_dashboard_path("/dashboard/assets/app.js"));
        assert!(!is_dashboard_path("/login.html"));
        assert!(!is_dashboard_path("/api/requests"));
    }

    #[test]
    fn session_cookie_attributes() {
        let cookie = session_cookie("abc".into(), 3600, true);
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }
}
