//! Error types for the loader crate.
//!
//! Everything here is recovered locally; nothing in the loading pipeline is
//! allowed to terminate the host process. Failure to bring up the worker
//! pool is fatal to the *pipeline* only: it reports itself unavailable and
//! the published lookup table is simply never populated.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the loading pipeline and loader context.
#[derive(Debug, Error)]
pub enum Error {
    /// A manifest entry's source file does not exist. The entry is dropped
    /// and not retried within the session.
    #[error("source file not found: {0}")]
    SourceMissing(PathBuf),

    /// The decoder rejected a blob or file. The identifier's path entry is
    /// retained so a forced rebuild can attempt it again.
    #[error("decode failed for {hash:#010x}: {reason}")]
    DecodeFailed { hash: u32, reason: String },

    /// The job queue was full. `accepted` jobs were submitted before the
    /// queue filled, so the caller can report partial progress.
    #[error("job queue saturated after {accepted} jobs")]
    QueueSaturated { accepted: usize },

    /// The worker pool could not be created, or has shut down.
    #[error("loading pipeline unavailable")]
    PipelineUnavailable,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TPF archive error.
    #[error(transparent)]
    Tpf(#[from] retex_tpf::Error),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, Error>;
