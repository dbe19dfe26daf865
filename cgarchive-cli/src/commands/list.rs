//! `cgarchive list`: archived handles at a glance.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use cgarchive_core::types::Handle;
use cgarchive_store::SnapshotIndex;

use crate::GlobalArgs;

/// Arguments for `cgarchive list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit the scanned index as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct ArchiveRow {
    #[tabled(rename = "handle")]
    handle: String,
    #[tabled(rename = "versions")]
    contributions: usize,
    #[tabled(rename = "comment sets")]
    comments: usize,
    #[tabled(rename = "latest")]
    latest: String,
}

impl ListArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<()> {
        let store = super::open_store(global)?;
        let index = store.scan_index().context("failed to scan archive")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&index).context("failed to serialize index")?
            );
            return Ok(());
        }

        print_table(&index, &store.root().display().to_string());
        Ok(())
    }
}

fn rows(index: &SnapshotIndex) -> Vec<ArchiveRow> {
    let handles: BTreeSet<&Handle> = index
        .contributions
        .keys()
        .chain(index.comments.keys())
        .collect();

    handles
        .into_iter()
        .map(|handle| {
            let versions = index.contributions.get(handle);
            let comment_sets = index.comments.get(handle);
            ArchiveRow {
                handle: handle.to_string(),
                contributions: versions.map_or(0, Vec::len),
                comments: comment_sets.map_or(0, Vec::len),
                latest: versions
                    .and_then(|v| v.first())
                    .map(|name| name.trim_end_matches(".json").to_string())
                    .unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect()
}

fn print_table(index: &SnapshotIndex, root: &str) {
    let rows = rows(index);
    println!(
        "cgarchive v{} | {} | {} handle(s) | {} snapshot(s)",
        env!("CARGO_PKG_VERSION"),
        root,
        rows.len(),
        index.snapshot_count()
    );
    if rows.is_empty() {
        println!("{}", "Archive is empty. Run `cgarchive sync` first.".bright_black());
        return;
    }
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_merge_both_namespaces() {
        let mut index = SnapshotIndex::default();
        index.contributions.insert(
            Handle::from("b"),
            vec![
                "2024-02-02_00-00-00.json".to_string(),
                "2024-01-01_00-00-00.json".to_string(),
            ],
        );
        index
            .comments
            .insert(Handle::from("a"), vec!["2024-01-01_00-00-00.json".to_string()]);

        let rows = rows(&index);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].handle, "a");
        assert_eq!(rows[0].contributions, 0);
        assert_eq!(rows[0].latest, "-");
        assert_eq!(rows[1].handle, "b");
        assert_eq!(rows[1].contributions, 2);
        assert_eq!(rows[1].latest, "2024-02-02_00-00-00");
    }
}
