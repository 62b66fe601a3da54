//! Error types for the cache crate.

use thiserror::Error;

/// Errors from loading a persisted identifier-mapping cache file.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A map key did not parse as a 32-bit identifier.
    #[error("invalid identifier key: {0:?}")]
    InvalidKey(String),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
