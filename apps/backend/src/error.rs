//! Errors returned by the result store API.
//!
//! Every variant renders as `{ "error": <code>, "message": <text> }` with a
//! matching HTTP status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("storage failure: {0}")]
    Database(#[from] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Missing, malformed or unknown bearer token.
    #[error("not signed in: {0}")]
    Unauthorized(&'static str),

    /// Token resolved to a user that has since been removed.
    #[error("user {0} is no longer registered")]
    UserNotFound(Uuid),

    /// No result with this id belongs to the caller.
    #[error("quiz result {0} not found")]
    ResultNotFound(Uuid),

    /// Submitted record cannot describe a completed session.
    #[error("invalid quiz result: {0}")]
    InvalidResult(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::UserNotFound(_) => (StatusCode::NOT_FOUND, "user_not_found"),
            Self::ResultNotFound(_) => (StatusCode::NOT_FOUND, "result_not_found"),
            Self::InvalidResult(_) => (StatusCode::BAD_REQUEST, "invalid_result"),
            Self::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            Self::Migration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "migration_error"),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Storage details stay in the log.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, code, "result store request failed");
            "the result store is unavailable".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorBody { error: code, message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
