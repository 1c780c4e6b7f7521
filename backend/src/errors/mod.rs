//! Global application error types and handlers.
//!
//! This module defines the error taxonomy shared by every handler and the
//! mapping onto HTTP responses. Clients only ever see a generic message in
//! `{"mensagem": ...}`; storage details are logged server-side.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reparo_adapters::StoreError;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input. The message is shown to the client.
    #[error("validation: {0}")]
    Validation(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(err) => err.status_code(),
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The text sent to the client.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Auth(err) => err.public_message().to_string(),
            AppError::NotFound => "Solicitação não encontrada".to_string(),
            AppError::Conflict(_) => "Registro já existe".to_string(),
            AppError::Storage(_) | AppError::Internal(_) => "Erro interno".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Storage(detail) => tracing::error!(error = %detail, "Storage failure"),
            AppError::Internal(detail) => tracing::error!(error = %detail, "Internal failure"),
            AppError::Conflict(detail) => tracing::warn!(error = %detail, "Uniqueness conflict"),
            AppError::Auth(err) => tracing::warn!(error = %err, "Rejected authentication"),
            _ => {}
        }
        let body = json!({ "mensagem": self.public_message() });
        (self.status_code(), Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_mapping() {
        assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::Storage("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn storage_detail_is_not_exposed() {
        let err = AppError::from(StoreError::Database("disk I/O error at /var/lib".into()));
        assert_eq!(err.public_message(), "Erro interno");
    }

    #[test]
    fn store_conflict_becomes_conflict() {
        let err = AppError::from(StoreError::Conflict("UNIQUE constraint failed".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
