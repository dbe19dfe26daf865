//! Derived snapshot index.
//!
//! Rebuilt wholesale from a directory scan; never updated incrementally.
//! Written with the `.tmp` + rename pattern so readers never see a partial
//! document.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use cgarchive_core::types::Handle;

use crate::error::{io_err, json_err, StoreError};
use crate::snapshot::SnapshotKind;

/// `{ contributions: {handle: [names, newest first]}, comments: {...} }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIndex {
    pub contributions: BTreeMap<Handle, Vec<String>>,
    pub comments: BTreeMap<Handle, Vec<String>>,
}

impl SnapshotIndex {
    pub fn entries(&self, kind: SnapshotKind) -> &BTreeMap<Handle, Vec<String>> {
        match kind {
            SnapshotKind::Contributions => &self.contributions,
            SnapshotKind::Comments => &self.comments,
        }
    }

    pub(crate) fn entries_mut(&mut self, kind: SnapshotKind) -> &mut BTreeMap<Handle, Vec<String>> {
        match kind {
            SnapshotKind::Contributions => &mut self.contributions,
            SnapshotKind::Comments => &mut self.comments,
        }
    }

    /// Total number of snapshot files across both namespaces.
    pub fn snapshot_count(&self) -> usize {
        self.contributions
            .values()
            .chain(self.comments.values())
            .map(Vec::len)
            .sum()
    }
}

/// Write `index` to `path`, replacing any previous document.
pub(crate) fn save(path: &Path, index: &SnapshotIndex) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(index).map_err(|e| json_err(path, e))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

/// Read an index document previously written by [`save`].
pub(crate) fn load(path: &Path) -> Result<Option<SnapshotIndex>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| json_err(path, e))
}
