//! Snapshot namespaces and file naming.
//!
//! A snapshot is named by its UTC write time at second resolution:
//!
//! ```text
//! 2024-05-01_09-30-00.json
//! 2024-05-01_09-30-00_01.json   (second write within the same second)
//! 2024-05-01_09-30-01.json
//! ```
//!
//! Fields are zero-padded and fixed-width, so lexicographic order is
//! chronological order. A sequence suffix sorts after its base name because
//! `_` > `.`, and before the next second because the timestamp prefix differs
//! earlier in the string.

use std::fmt;

use chrono::{DateTime, Utc};

use cgarchive_core::types::Handle;

use crate::error::StoreError;

/// Name of the aggregated index document at the archive root.
pub const INDEX_FILE: &str = "index.json";

/// Highest sequence suffix tried for a single second.
pub const MAX_SEQUENCE: u32 = 99;

const STAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Which record kind a snapshot holds; each kind has its own directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotKind {
    Contributions,
    Comments,
}

impl SnapshotKind {
    pub fn all() -> &'static [SnapshotKind] {
        &[SnapshotKind::Contributions, SnapshotKind::Comments]
    }

    /// Directory name under the archive root.
    pub fn dir_name(self) -> &'static str {
        match self {
            SnapshotKind::Contributions => "contributions",
            SnapshotKind::Comments => "comments",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// File name for a snapshot written at `at`; `sequence` 0 means no suffix.
pub fn snapshot_file_name(at: DateTime<Utc>, sequence: u32) -> String {
    let stamp = at.format(STAMP_FORMAT);
    if sequence == 0 {
        format!("{stamp}.json")
    } else {
        format!("{stamp}_{sequence:02}.json")
    }
}

/// Whether a directory entry name is a snapshot file.
///
/// Excludes the index document, hidden files, and in-flight `.tmp` files.
pub fn is_snapshot_file_name(name: &str) -> bool {
    name.ends_with(".json") && name != INDEX_FILE && !name.starts_with('.')
}

/// Reject handles that would escape their namespace directory.
pub fn validate_handle(handle: &Handle) -> Result<(), StoreError> {
    let raw = handle.as_str();
    let invalid = raw.is_empty()
        || raw == "."
        || raw == ".."
        || raw.starts_with('.')
        || raw.contains(['/', '\\', '\0']);
    if invalid {
        return Err(StoreError::InvalidHandle {
            handle: raw.to_string(),
        });
    }
    Ok(())
}
