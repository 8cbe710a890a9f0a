//! Error types for the lola system.

use thiserror::Error;

/// Result type alias using LolaError.
pub type Result<T> = std::result::Result<T, LolaError>;

/// Errors that can occur in the lola system.
#[derive(Error, Debug)]
pub enum LolaError {
    /// Chat session not found.
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// Collection not found on the backend.
    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    /// Invalid argument provided.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Error reported by the external RAG backend.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl LolaError {
    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LolaError::SessionNotFound {
            id: "abc123".to_string(),
        };
        assert!(err.to_string().contains("abc123"));
    }

    #[test]
    fn test_backend_error_message() {
        let err = LolaError::backend("upsert failed");
        assert_eq!(err.to_string(), "Backend error: upsert failed");
    }
}
