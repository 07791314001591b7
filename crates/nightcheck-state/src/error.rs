//! Error types for nightcheck-state

use thiserror::Error;

/// Errors raised while connecting to or preparing the database.
#[derive(Error, Debug)]
pub enum StateError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Database query error
    #[error("Database query failed: {0}")]
    Query(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),
}

impl From<surrealdb::Error> for StateError {
    fn from(err: surrealdb::Error) -> Self {
        StateError::Query(err.to_string())
    }
}

/// Errors returned by [`crate::ErrorStore`] operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Row rejected before reaching the backend.
    #[error("invalid row for {caller}: {reason}")]
    InvalidRow { caller: String, reason: String },

    /// Backend failure, carried as text.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StateError> for StorageError {
    fn from(err: StateError) -> Self {
        StorageError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_error_converts_to_backend() {
        let err: StorageError = StateError::Connection("refused".into()).into();
        assert!(matches!(err, StorageError::Backend(_)));
        assert!(err.to_string().contains("refused"));
    }

    #[test]
    fn test_invalid_row_display() {
        let err = StorageError::InvalidRow {
            caller: String::new(),
            reason: "empty caller".into(),
        };
        assert_eq!(err.to_string(), "invalid row for : empty caller");
    }
}
