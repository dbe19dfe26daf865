//! # cgarchive-store
//!
//! Write-once snapshot archive for contributions and their comment sets,
//! plus the derived `index.json`.
//!
//! Open an [`ArchiveStore`] once per run; it is the only writer to its
//! directory tree.

pub mod error;
pub mod index;
pub mod snapshot;
pub mod store;

pub use error::StoreError;
pub use index::SnapshotIndex;
pub use snapshot::{SnapshotKind, INDEX_FILE};
pub use store::ArchiveStore;
