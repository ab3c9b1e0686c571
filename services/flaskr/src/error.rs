//! Error types for the Flaskr service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use serde_json::json;
use thiserror::Error;
use tower_sessions::session;
use tracing::error;

/// Failures of the registration and login flows
///
/// The display text of every recoverable variant is the message shown to
/// the user.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Username is required.")]
    UsernameRequired,

    #[error("Password is required.")]
    PasswordRequired,

    #[error("User {0} is already registered.")]
    AlreadyRegistered(String),

    #[error("Incorrect username.")]
    IncorrectUsername,

    #[error("Incorrect password.")]
    IncorrectPassword,

    /// Unknown username or wrong password, when the two are not told apart
    #[error("Incorrect username or password.")]
    InvalidCredentials,

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Session store error: {0}")]
    Session(#[from] session::Error),
}

/// Broad classes of [`AuthError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// A required field was empty
    Validation,
    /// The username is taken
    Conflict,
    /// Unknown username or wrong password
    Authentication,
    /// Store, session or hashing failure; not the user's fault
    Internal,
}

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::UsernameRequired | AuthError::PasswordRequired => AuthErrorKind::Validation,
            AuthError::AlreadyRegistered(_) => AuthErrorKind::Conflict,
            AuthError::IncorrectUsername
            | AuthError::IncorrectPassword
            | AuthError::InvalidCredentials => AuthErrorKind::Authentication,
            AuthError::Hashing(_) | AuthError::Database(_) | AuthError::Session(_) => {
                AuthErrorKind::Internal
            }
        }
    }

    /// Status used when the form is rendered again with this error
    pub fn status(&self) -> StatusCode {
        match self.kind() {
            AuthErrorKind::Validation => StatusCode::BAD_REQUEST,
            AuthErrorKind::Conflict => StatusCode::CONFLICT,
            AuthErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            AuthErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Request-fatal errors, rendered as a JSON error body
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Session error: {0}")]
    Session(#[from] session::Error),

    #[error("Internal server error")]
    InternalServerError,
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Database(e) => AppError::Database(e),
            AuthError::Session(e) => AppError::Session(e),
            other => {
                error!("Unrecovered authentication error: {}", other);
                AppError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::Database(e) => {
                error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Session(e) => {
                error!("Session error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for handler results
pub type AppResult<T> = Result<T, AppError>;
