//! Shared state handed to every handler.

use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use reparo_adapters::Storage;

use crate::auth::AuthService;
use crate::services::RequestManager;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub auth: Arc<AuthService>,
    pub requests: RequestManager,
    pub cookie_key: Key,
    /// Adds the `Secure` attribute to the session cookie.
    pub secure_cookies: bool,
}

impl AppState {
    /// `session_secret` must be at least 32 bytes; the configuration layer
    /// rejects anything shorter.
    pub fn new(
        storage: Arc<dyn Storage>,
        auth: Arc<AuthService>,
        session_secret: &str,
        secure_cookies: bool,
    ) -> Self {
        Self {
            requests: RequestManager::new(storage.clone()),
            storage,
            auth,
            cookie_key: Key::derive_from(session_secret.as_bytes()),
            secure_cookies,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
