use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::export::ExportError;
use crate::llm_client::GenerationError;
use crate::session::AuthError;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so JSON handlers can return `Result<T, AppError>`;
/// HTML handlers turn it into a notification via `user_message`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message safe to show to the signed-in user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Unauthorized => "Please sign in to continue.".to_string(),
            AppError::Generation(e) => e.user_message().to_string(),
            AppError::Store(StoreError::NotFound(_)) => "Document not found.".to_string(),
            AppError::Store(_) => "The document service is unavailable. Please try again.".to_string(),
            AppError::Auth(e) => e.user_message().to_string(),
            AppError::Export(_) => "Failed to download document. Please try again.".to_string(),
            AppError::Session(_) | AppError::Template(_) | AppError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Generation(e) => {
                tracing::error!("Generation error: {e}");
                (StatusCode::BAD_GATEWAY, e.code())
            }
            AppError::Store(StoreError::NotFound(_)) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Store(e) => {
                tracing::error!("Store error: {e}");
                (StatusCode::BAD_GATEWAY, "STORE_ERROR")
            }
            AppError::Auth(e) => {
                tracing::warn!("Auth error: {e}");
                (e.status(), "AUTH_ERROR")
            }
            AppError::Export(e) => {
                tracing::error!("Export error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "EXPORT_ERROR")
            }
            AppError::Session(e) => {
                tracing::error!("Session error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_ERROR")
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "TEMPLATE_ERROR")
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.user_message()
            }
        }));

        (status, body).into_response()
    }
}
