//! Error types for cgarchive-sync.

use thiserror::Error;

use cgarchive_api::ApiError;
use cgarchive_store::StoreError;

/// Fatal errors that abort a sync run.
///
/// Per-handle failures never surface here; they are logged and recorded in
/// the run report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// One of the two bulk list calls failed; there is nothing to process.
    #[error("failed to list contributions: {0}")]
    ListFetch(#[source] ApiError),

    /// The archive could not be opened or the index could not be rebuilt.
    #[error("archive error: {0}")]
    Store(#[from] StoreError),
}
