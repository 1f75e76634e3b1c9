use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use crate::domain::services::{guest_import::ImportError, wizard::WizardError};

pub const GENERIC_FAILURE: &str = "Something went wrong, try again";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Invalid rows: {}", .0.join("; "))]
    InvalidRows(Vec<String>),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn is_unique_violation(&self) -> bool {
        match self {
            AppError::Database(e) => e.as_database_error()
                .and_then(|db_err| db_err.code())
                // 2067 = SQLite unique constraint, 1555 = SQLite primary key, 23505 = PostgreSQL unique violation
                .is_some_and(|code| code == "2067" || code == "1555" || code == "23505"),
            _ => false,
        }
    }

    /// Text safe to show a client. Storage and internal failures collapse into a generic message.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal | AppError::InternalWithMsg(_) => GENERIC_FAILURE.to_string(),
            AppError::NotFound(msg) | AppError::Forbidden(msg) | AppError::Conflict(msg) | AppError::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        AppError::InvalidRows(err.errors)
    }
}

impl From<WizardError> for AppError {
    fn from(err: WizardError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_unique_violation() {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "error": "Resource already exists (duplicate entry)" }))
            ).into_response();
        }

        if let AppError::InvalidRows(errors) = &self {
            warn!(count = errors.len(), "Rejected batch with invalid rows");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Some rows are invalid", "errors": errors }))
            ).into_response();
        }

        let (status, message) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::InvalidRows(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };

        if status.is_client_error() {
            warn!(status = status.as_u16(), "{}", message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Failures that abort process startup before the server is listening.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid signing key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
