pub mod index;
pub mod list;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};

use cgarchive_core::config::{self, DEFAULT_DATA_DIR};
use cgarchive_store::ArchiveStore;

use crate::GlobalArgs;

/// Archive root for commands that need no credentials.
///
/// `--data-dir`/`DATA_DIR` wins, then the config file, then the default.
pub(crate) fn resolve_data_dir(global: &GlobalArgs) -> Result<PathBuf> {
    if let Some(dir) = &global.data_dir {
        return Ok(dir.clone());
    }
    let file = config::load_optional(global.config.as_deref())
        .context("failed to load config file")?;
    Ok(file
        .and_then(|f| f.data_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)))
}

pub(crate) fn open_store(global: &GlobalArgs) -> Result<ArchiveStore> {
    let root = resolve_data_dir(global)?;
    ArchiveStore::open(&root)
        .with_context(|| format!("failed to open archive at {}", root.display()))
}
