//! `cgarchive index`: rebuild index.json without contacting the service.

use anyhow::{Context, Result};
use clap::Args;

use crate::GlobalArgs;

/// Arguments for `cgarchive index`.
#[derive(Args, Debug)]
pub struct IndexArgs {}

impl IndexArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let store = super::open_store(global)?;
        let index = store.rebuild_index().context("failed to rebuild index")?;
        println!(
            "✓ wrote {} ({} contribution handle(s), {} comment handle(s), {} snapshot(s))",
            store.index_path().display(),
            index.contributions.len(),
            index.comments.len(),
            index.snapshot_count()
        );
        Ok(())
    }
}
