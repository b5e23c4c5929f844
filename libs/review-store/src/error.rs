//! Error handling for the Postgres card store

use review_core::{CardId, PersistenceError};
use thiserror::Error;

/// Store error types
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Card not found: {0}")]
    CardNotFound(CardId),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for PersistenceError {
    fn from(err: StoreError) -> Self {
        PersistenceError::with_source(err.to_string(), err)
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
