//! Error types for the Cairn sync engine.

use thiserror::Error;

/// Result type alias using Cairn's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Cairn operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Generic not-found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource not found in the registry
    #[error("Resource not found: {0}")]
    ResourceNotFound(uuid::Uuid),

    /// Document loader failed
    #[error("Loader error: {0}")]
    Loader(String),

    /// Vector index operation failed
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// Operation exceeded its deadline
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
