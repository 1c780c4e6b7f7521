//! General-purpose middleware for the API.
//!
//! This module contains the CORS policy built from the configured origin
//! allow-list and the HTTPS redirect used behind a TLS-terminating proxy in
//! production.

use axum::extract::Request;
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderValue, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tower_http::cors::{AllowOrigin, CorsLayer};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// CORS for the dashboard: listed origins only, cookies allowed.
pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(origin = %origin, error = %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true)
}

fn https_location(request: &Request) -> Option<String> {
    let proto = request.headers().get(FORWARDED_PROTO)?.to_str().ok()?;
    if !proto.eq_ignore_ascii_case("http") {
        return None;
    }
    let host = request.headers().get(HOST)?.to_str().ok()?;
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    Some(format!("https://{host}{path}"))
}

/// Sends plain-HTTP requests forwarded by the proxy to their `https://` URL.
pub async fn redirect_to_https(request: Request, next: Next) -> Response {
    match https_location(&request) {
        Some(location) => Redirect::permanent(&location).into_response(),
        None => next.run(request).await,
    }
}
