use std::io;
use thiserror::Error;

/// Error type shared by the engine, the stores and the actors.
#[derive(Debug, Error)]
pub enum AppError {
    /// The SQLite store rejected a query or could not be opened.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The profile store could not be reached or refused the write.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A profile actor or the supervisor could not be reached.
    #[error("Actor error: {0}")]
    Actor(#[from] crate::actors::messages::ActorError),

    /// Input that cannot be folded into a profile (non-finite scores, bad JSON).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unparsable or out-of-range settings.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A broken invariant. Indicates a bug.
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation timed out: {0}")]
    Timeout(String),
}

// sqlx and io errors are not Clone; replies fanned out to several waiters need copies
impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Database(e) => AppError::Database(sqlx::Error::Protocol(e.to_string())),
            AppError::StoreUnavailable(s) => AppError::StoreUnavailable(s.clone()),
            AppError::Io(e) => AppError::Io(io::Error::new(e.kind(), e.to_string())),
            AppError::Actor(e) => AppError::Actor(e.clone()),
            AppError::Validation(s) => AppError::Validation(s.clone()),
            AppError::Config(s) => AppError::Config(s.clone()),
            AppError::Internal(s) => AppError::Internal(s.clone()),
            AppError::Timeout(s) => AppError::Timeout(s.clone()),
        }
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        AppError::Timeout(format!("No answer in time: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON error: {}", err))
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::Validation(format!("Invalid URL: {}", err))
    }
}

/// Validation failures only come from loading settings.
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Config(format!("Invalid settings: {}", err))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(sqlx::Error::Migrate(Box::new(err)))
    }
}
