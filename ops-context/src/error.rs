use thiserror::Error;

use crate::models::DataSource;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Source {origin} unavailable: {message}")]
    SourceUnavailable { origin: DataSource, message: String },

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Seed data error: {0}")]
    SeedError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ContextError {
    pub fn source_unavailable(origin: DataSource, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            origin,
            message: message.into(),
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for ContextError {
    fn from(err: sqlx::Error) -> Self {
        ContextError::StorageError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ContextError>;
