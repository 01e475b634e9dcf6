//! Error types for usage computation

use thiserror::Error;

pub type UsageResult<T> = Result<T, UsageError>;

#[derive(Debug, Error)]
pub enum UsageError {
    /// A looked-up resource (organization, asset) does not exist.
    /// Embedding layers map this to a 404-style response.
    #[error("{0} not found")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl UsageError {
    pub fn not_found(what: impl Into<String>) -> Self {
        UsageError::NotFound(what.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, UsageError::NotFound(_))
    }
}

impl From<sqlx::Error> for UsageError {
    fn from(err: sqlx::Error) -> Self {
        UsageError::Database(err.to_string())
    }
}
