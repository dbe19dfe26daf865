//! Error types for cgarchive-store.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from archive operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A snapshot or index document could not be encoded or decoded.
    #[error("snapshot JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The handle cannot be used as a directory name inside the archive.
    #[error("invalid handle '{handle}': must be a single path component")]
    InvalidHandle { handle: String },

    /// Every sequence suffix for this second is already taken.
    #[error("no free snapshot name left in {path} for this second")]
    SequenceExhausted { path: PathBuf },
}

/// Convenience constructor for [`StoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`StoreError::Json`].
pub(crate) fn json_err(path: impl Into<PathBuf>, source: serde_json::Error) -> StoreError {
    StoreError::Json {
        path: path.into(),
        source,
    }
}
