//! Custom error types for the memory scoring system.

use thiserror::Error;

/// Errors that can occur in the memory scoring system.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Malformed input to a public operation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A memory id that is not present in the store.
    #[error("Reference error: unknown memory id {0}")]
    Reference(String),

    /// A connection whose source and target are the same memory.
    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    /// Database-related errors (SQLite snapshot layer only).
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = MemoryError::Reference("mem_1".to_string());
        assert_eq!(err.to_string(), "Reference error: unknown memory id mem_1");

        let err = MemoryError::Validation("strength 2 out of range".to_string());
        assert!(err.to_string().starts_with("Validation error"));
    }
}
