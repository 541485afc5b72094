//! Error types for the recovery-companion library.
//!
//! This module provides custom error types using `thiserror` for better error handling
//! and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the recovery-companion application.
#[derive(Error, Debug)]
pub enum RecoveryError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Binary serialization errors
    #[error("Binary serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Conversation storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Health-data integration is not reachable
    #[error("Health data unavailable: {0}")]
    HealthUnavailable(String),

    /// The session is not allowed to view clinician data
    #[error("Access denied: {0}")]
    Unauthorized(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with RecoveryError
pub type Result<T> = std::result::Result<T, RecoveryError>;

impl From<anyhow::Error> for RecoveryError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<sled::Error> for RecoveryError {
    fn from(err: sled::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sled_error_maps_to_storage() {
        let err: RecoveryError = sled::Error::Unsupported("read-only".to_string()).into();
        assert!(matches!(err, RecoveryError::Storage(_)));
        assert!(err.to_string().starts_with("Storage error"));
    }

    #[test]
    fn test_unauthorized_message() {
        let err = RecoveryError::Unauthorized("Clinicians only".to_string());
        assert_eq!(err.to_string(), "Access denied: Clinicians only");
    }
}
