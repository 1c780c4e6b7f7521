//! HTTP backend for the Reparo lead-intake form and staff dashboard.
//!
//! The binary in `main.rs` only loads configuration and calls into this
//! library, so integration tests can start the same server on an ephemeral
//! port.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::auth::{
    auth_router, dashboard_gate, AuthService, GoogleIdTokenVerifier, IdTokenVerifier,
    PasswordHasher, SessionStore,
};
use crate::config::Config;
use crate::state::AppState;

/// Opens storage, builds the auth service and runs the first-boot account
/// bootstrap.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let storage = database::connect(&config.storage).await?;

    let verifier: Option<Arc<dyn IdTokenVerifier>> = match &config.google_client_id {
        Some(client_id) => {
            tracing::info!("Google login enabled");
            Some(Arc::new(GoogleIdTokenVerifier::new(client_id.clone())))
        }
        None => {
            tracing::info!("GOOGLE_CLIENT_ID not set; Google login disabled");
            None
        }
    };

    let auth = AuthService::new(
        storage.clone(),
        SessionStore::new(config.session_ttl),
        PasswordHasher::new(config.bcrypt_cost),
        verifier,
    )
    .await?;
    auth.ensure_default_user(&config.admin, config.production)
        .await?;

    Ok(AppState::new(
        storage,
        Arc::new(auth),
        &config.session_secret,
        config.production,
    ))
}

/// Assembles routes, the static frontend and the middleware stack.
pub fn build_app(state: AppState, config: &Config) -> Router {
    let app = Router::new()
        .merge(auth_router())
        .nest("/api", api::api_router())
        .route("/healthz", get(api::healthz));

    let app = match &config.static_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Serving static files");
            let index = dir.join("index.html");
            app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)))
        }
        None => app,
    };

    let app = app
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            dashboard_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer(&config.allowed_origins));

    let app = if config.production {
        app.layer(axum::middleware::from_fn(middleware::redirect_to_https))
    } else {
        app
    };

    app.with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: tokio::net::TcpListener, app: Router, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
