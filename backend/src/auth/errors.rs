//! Custom error types specific to authentication failures.
//!
//! Every variant that reaches a client collapses to a fixed message, so a
//! caller cannot tell an unknown username from a wrong password.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username, wrong password, or an account without a local
    /// password.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("missing or expired session")]
    Unauthenticated,

    #[error("invalid identity token: {0}")]
    InvalidIdToken(String),

    #[error("federated login is not configured")]
    FederatedDisabled,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::FederatedDisabled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::UNAUTHORIZED,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Credenciais inválidas",
            AuthError::Unauthenticated => "Não autorizado",
            AuthError::InvalidIdToken(_) => "Token inválido",
            AuthError::FederatedDisabled => "Login com Google não configurado",
        }
    }
}
