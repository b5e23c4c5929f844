//! Error types for review-core.

use thiserror::Error;

/// Result type alias using ReviewError.
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Errors raised by the scheduler, the grade types and the review session.
#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("invalid grade: {0} (expected an integer between 0 and 5)")]
    InvalidGrade(String),

    #[error("invalid scheduling state: {0}")]
    InvalidState(String),

    #[error("invalid scheduler configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("cannot {action} while session is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// A card store failed to read or write scheduling data.
///
/// Stores wrap their own error types in this so the session controller can
/// surface failures without knowing the storage technology behind them.
#[derive(Debug, Error)]
#[error("persistence failed: {message}")]
pub struct PersistenceError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl PersistenceError {
    /// Create an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping the store's own error.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display_invalid_grade() {
        let error = ReviewError::InvalidGrade("6".to_string());
        assert_eq!(
            error.to_string(),
            "invalid grade: 6 (expected an integer between 0 and 5)"
        );
    }

    #[test]
    fn test_error_display_invalid_transition() {
        let error = ReviewError::InvalidTransition {
            action: "grade",
            state: "presenting",
        };
        assert_eq!(error.to_string(), "cannot grade while session is presenting");
    }

    #[test]
    fn test_persistence_error_is_transparent() {
        let error = ReviewError::from(PersistenceError::new("connection reset"));
        assert_eq!(error.to_string(), "persistence failed: connection reset");
    }

    #[test]
    fn test_persistence_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let error = PersistenceError::with_source("write failed", io);
        assert_eq!(error.source().map(|s| s.to_string()), Some("disk full".to_string()));
    }

    #[test]
    fn test_persistence_error_without_source() {
        let error = PersistenceError::new("timeout");
        assert!(error.source().is_none());
        assert_eq!(error.message(), "timeout");
    }
}
