//! Error types for the TPF crate.

use thiserror::Error;

/// Errors that can occur when reading TPF texture packs.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data does not look like a TPF container.
    #[error("not a TPF archive: no ZIP signature after XOR layer")]
    NotATpf,

    /// ZIP parsing or decryption error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// An archive entry could not be extracted.
    #[error("failed to extract entry {name:?}: {reason}")]
    Extract { name: String, reason: String },
}

/// Result type for TPF operations.
pub type Result<T> = std::result::Result<T, Error>;
