//! Timestamp-versioned snapshot archive.
//!
//! # Storage layout
//!
//! ```text
//! <root>/
//!   contributions/<handle>/<timestamp>.json   (one contribution detail)
//!   comments/<handle>/<timestamp>.json        (one array of comments)
//!   index.json                                (derived, rebuilt wholesale)
//! ```
//!
//! # Write protocol
//!
//! 1. Encode the record as pretty JSON.
//! 2. Write it to a hidden `.tmp` file in the handle directory.
//! 3. Hard-link the `.tmp` file to the first free snapshot name for the
//!    current second (`AlreadyExists` moves on to the next sequence suffix).
//! 4. Remove the `.tmp` file.
//!
//! Linking never replaces an existing file, so snapshots are immutable once
//! written.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use cgarchive_core::types::{Comment, ContributionDetail, Handle};

use crate::error::{io_err, json_err, StoreError};
use crate::index::{self, SnapshotIndex};
use crate::snapshot::{
    is_snapshot_file_name, snapshot_file_name, validate_handle, SnapshotKind, INDEX_FILE,
    MAX_SEQUENCE,
};

/// Sole owner of the on-disk archive.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    root: PathBuf,
}

impl ArchiveStore {
    /// Open the archive at `root`, creating both namespace directories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        for kind in SnapshotKind::all() {
            let dir = root.join(kind.dir_name());
            std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/index.json`: pure, no I/O.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// `<root>/<kind>/`: pure, no I/O.
    pub fn namespace_dir(&self, kind: SnapshotKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }

    /// `<root>/<kind>/<handle>/`, after validating the handle.
    pub fn snapshot_dir(&self, kind: SnapshotKind, handle: &Handle) -> Result<PathBuf, StoreError> {
        validate_handle(handle)?;
        Ok(self.namespace_dir(kind).join(handle.as_str()))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Snapshot file names for `handle`, newest first.
    ///
    /// A handle that was never archived yields an empty list.
    pub fn snapshot_names(
        &self,
        kind: SnapshotKind,
        handle: &Handle,
    ) -> Result<Vec<String>, StoreError> {
        let dir = self.snapshot_dir(kind, handle)?;
        list_snapshot_names(&dir)
    }

    /// Path of the newest snapshot, if any.
    pub fn latest_snapshot_path(
        &self,
        kind: SnapshotKind,
        handle: &Handle,
    ) -> Result<Option<PathBuf>, StoreError> {
        let dir = self.snapshot_dir(kind, handle)?;
        Ok(list_snapshot_names(&dir)?
            .into_iter()
            .next()
            .map(|name| dir.join(name)))
    }

    pub fn has_contribution_snapshot(&self, handle: &Handle) -> Result<bool, StoreError> {
        Ok(self
            .latest_snapshot_path(SnapshotKind::Contributions, handle)?
            .is_some())
    }

    pub fn latest_contribution_snapshot(
        &self,
        handle: &Handle,
    ) -> Result<Option<ContributionDetail>, StoreError> {
        self.read_latest(SnapshotKind::Contributions, handle)
    }

    pub fn latest_comment_snapshot(
        &self,
        handle: &Handle,
    ) -> Result<Option<Vec<Comment>>, StoreError> {
        self.read_latest(SnapshotKind::Comments, handle)
    }

    fn read_latest<T: DeserializeOwned>(
        &self,
        kind: SnapshotKind,
        handle: &Handle,
    ) -> Result<Option<T>, StoreError> {
        let Some(path) = self.latest_snapshot_path(kind, handle)? else {
            return Ok(None);
        };
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| json_err(&path, e))
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Archive a new contribution snapshot stamped with the current time.
    pub fn write_contribution_snapshot(
        &self,
        handle: &Handle,
        detail: &ContributionDetail,
    ) -> Result<PathBuf, StoreError> {
        self.write_snapshot(SnapshotKind::Contributions, handle, detail, Utc::now())
    }

    /// Archive a new comment-set snapshot stamped with the current time.
    pub fn write_comment_snapshot(
        &self,
        handle: &Handle,
        comments: &[Comment],
    ) -> Result<PathBuf, StoreError> {
        self.write_snapshot(SnapshotKind::Comments, handle, comments, Utc::now())
    }

    /// Archive `record` under `handle` with a name derived from `at`.
    ///
    /// Returns the path of the new snapshot file.
    pub fn write_snapshot<T: Serialize + ?Sized>(
        &self,
        kind: SnapshotKind,
        handle: &Handle,
        record: &T,
        at: DateTime<Utc>,
    ) -> Result<PathBuf, StoreError> {
        let dir = self.snapshot_dir(kind, handle)?;
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

        let base_name = snapshot_file_name(at, 0);
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| json_err(dir.join(&base_name), e))?;

        let tmp = dir.join(format!(".{base_name}.{}.tmp", std::process::id()));
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;

        let result = link_first_free(&tmp, &dir, at);
        let _ = std::fs::remove_file(&tmp);
        let path = result?;

        tracing::info!("archived {kind} snapshot: {}", path.display());
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Index
    // -----------------------------------------------------------------------

    /// Build the index from a directory scan without writing it.
    ///
    /// Every handle directory appears, including ones with no snapshots.
    pub fn scan_index(&self) -> Result<SnapshotIndex, StoreError> {
        let mut index = SnapshotIndex::default();
        for kind in SnapshotKind::all() {
            let namespace = self.namespace_dir(*kind);
            if !namespace.exists() {
                continue;
            }
            let entries = index.entries_mut(*kind);
            for (handle, dir) in handle_dirs(&namespace)? {
                entries.insert(handle, list_snapshot_names(&dir)?);
            }
        }
        Ok(index)
    }

    /// Rescan both namespaces and replace `<root>/index.json`.
    pub fn rebuild_index(&self) -> Result<SnapshotIndex, StoreError> {
        let index = self.scan_index()?;
        let path = self.index_path();
        index::save(&path, &index)?;
        tracing::info!(
            "rebuilt index: {} contribution handle(s), {} comment handle(s)",
            index.contributions.len(),
            index.comments.len()
        );
        Ok(index)
    }

    /// The last index written by [`rebuild_index`](Self::rebuild_index), if any.
    pub fn load_index(&self) -> Result<Option<SnapshotIndex>, StoreError> {
        index::load(&self.index_path())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn link_first_free(tmp: &Path, dir: &Path, at: DateTime<Utc>) -> Result<PathBuf, StoreError> {
    for sequence in 0..=MAX_SEQUENCE {
        let path = dir.join(snapshot_file_name(at, sequence));
        match std::fs::hard_link(tmp, &path) {
            Ok(()) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("snapshot name taken: {}", path.display());
            }
            Err(e) => return Err(io_err(&path, e)),
        }
    }
    Err(StoreError::SequenceExhausted {
        path: dir.to_path_buf(),
    })
}

/// Snapshot file names in `dir`, newest first; empty if `dir` is absent.
fn list_snapshot_names(dir: &Path) -> Result<Vec<String>, StoreError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(io_err(dir, e)),
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| is_snapshot_file_name(name))
        .collect();
    names.sort_unstable_by(|a, b| b.cmp(a));
    Ok(names)
}

/// Handle directories directly under a namespace, sorted by name.
fn handle_dirs(namespace: &Path) -> Result<Vec<(Handle, PathBuf)>, StoreError> {
    let mut dirs: Vec<(Handle, PathBuf)> = std::fs::read_dir(namespace)
        .map_err(|e| io_err(namespace, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().into_string().ok()?;
            (!name.starts_with('.')).then(|| (Handle::from(name), e.path()))
        })
        .collect();
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}
