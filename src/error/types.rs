// src/error/types.rs
//
// Application-level error taxonomy.
//
// Domain rule violations stay typed so callers can match on them;
// infrastructure failures collapse into one variant per layer. All of
// these are locally recoverable: callers surface a rejected action,
// never abort.

use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A business rule rejected the operation
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// SQLite reported a failure
    #[error("database: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection pool could not hand out a connection
    #[error("connection pool: {0}")]
    Pool(String),

    /// A JSON column failed to (de)serialize
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// An entity looked up by id is gone
    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

// Errors cross the API boundary as their display string
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
