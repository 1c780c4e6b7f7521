//! Authentication module for staff accounts, sessions, and access control.
//!
//! This module provides local password login, Google ID-token login, the
//! in-memory session registry and the extractor that guards the protected
//! API endpoints.

pub mod errors;
pub mod google;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod routes;
pub mod service;
pub mod session;

// Re-exports for convenience
pub use errors::AuthError;
pub use google::{GoogleIdTokenVerifier, IdTokenVerifier};
pub use middleware::{dashboard_gate, AuthUser};
pub use models::{FederatedIdentity, SessionUser};
pub use password::PasswordHasher;
pub use routes::auth_router;
pub use service::AuthService;
pub use session::{SessionStore, SESSION_COOKIE};
