//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure a handler or the auth guard can produce is one of its variants, and
//! `AppError` implements `actix_web::error::ResponseError` so each variant turns into
//! an HTTP status plus a JSON body of the form `{"error": "<message>"}`.
//!
//! Server-side failures (database, cache, internal) are logged with their details and
//! answered with a generic message, so connection strings and driver errors never
//! reach the client.

use actix_web::{
    error::{BlockingError, ResponseError},
    http::StatusCode,
    HttpResponse,
};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::token::TokenError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input (HTTP 400).
    #[error("Validation Error: {0}")]
    Validation(String),
    /// A user with the same username or email already exists (HTTP 400).
    #[error("User or email already exists")]
    DuplicateUser,
    /// Login for a username that is not registered (HTTP 404).
    #[error("User not found")]
    UserNotFound,
    /// Password did not match the stored hash (HTTP 400).
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// No `Authorization` header on a request that needs one (HTTP 401).
    #[error("No token provided")]
    MissingToken,
    /// The presented token failed verification at logout (HTTP 400).
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    /// The presented token was revoked by a logout (HTTP 403).
    #[error("Token has been logged out")]
    RevokedToken,
    /// The guard refused a token that failed verification (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),
    /// A client-side error outside the auth flow (HTTP 400).
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// A requested resource was not found (HTTP 404).
    #[error("Not Found: {0}")]
    NotFound(String),
    /// Failure in the credential or task store (HTTP 500).
    #[error("Database Error: {0}")]
    Database(String),
    /// Failure in the session cache (HTTP 500).
    #[error("Cache Error: {0}")]
    Cache(String),
    /// Any other unexpected server-side error (HTTP 500).
    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// The message sent to the client. Server-side variants hide their details.
    fn client_message(&self) -> String {
        match self {
            AppError::Validation(msg) => format!("Invalid input: {}", msg),
            AppError::InvalidToken(_) => "Invalid or expired token".to_string(),
            AppError::Forbidden(msg) | AppError::BadRequest(msg) | AppError::NotFound(msg) => {
                msg.clone()
            }
            AppError::Database(_) => "Database error".to_string(),
            AppError::Cache(_) => "Session store error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::DuplicateUser
            | AppError::InvalidCredentials
            | AppError::InvalidToken(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken => StatusCode::UNAUTHORIZED,
            AppError::RevokedToken | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(json!({
            "error": self.client_message()
        }))
    }
}

/// Converts `sqlx::Error` into `AppError::Database`.
///
/// Unique violations are interpreted by the credential store itself, so anything
/// reaching this conversion is an unexpected database failure.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        AppError::Database(error.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(error: redis::RedisError) -> AppError {
        AppError::Cache(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::Validation`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::Validation(error.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(error: TokenError) -> AppError {
        AppError::InvalidToken(error.to_string())
    }
}

impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::Internal(format!("blocking task failed: {}", error))
    }
}
