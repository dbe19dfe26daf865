//! Sync orchestration.
//!
//! ## `sync_contributions`: per run
//!
//! 1. Union pending + accepted by handle.
//! 2. Resolve extra handles.
//! 3. Apply the optional test filter.
//! 4. For each handle, plan both updates against the archive.
//! 5. Refresh the contribution snapshot if planned.
//! 6. Refresh the comment snapshot if planned.
//! 7. Rebuild the index.
//!
//! Steps 5 and 6 are isolated per handle and from each other: a failure is
//! logged, recorded as [`StepOutcome::Failed`], and the run moves on.

use std::path::PathBuf;

use serde::Serialize;

use cgarchive_api::ContributionApi;
use cgarchive_core::{
    types::{ContributionSummary, Handle},
    Config,
};
use cgarchive_store::{ArchiveStore, SnapshotIndex};

use crate::comments::collect_comments;
use crate::error::SyncError;
use crate::plan::{plan_update, UpdateReason};
use crate::working_set::build_working_set;

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// Per-run knobs taken from the resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub extra_handles: Vec<Handle>,
    pub test_handles: Option<Vec<Handle>>,
    /// Plan only: no detail or comment fetches, no writes, no index rebuild.
    pub dry_run: bool,
}

impl RunOptions {
    pub fn from_config(config: &Config, dry_run: bool) -> Self {
        Self {
            extra_handles: config.extra_handles.clone(),
            test_handles: config.test_handles.clone(),
            dry_run,
        }
    }
}

/// Outcome of one snapshot step for one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Archive already matches the remote state.
    Unchanged,
    /// A new snapshot was written.
    Written { path: PathBuf },
    /// `--dry-run` mode: a snapshot *would* have been written.
    WouldWrite { reason: String },
    /// The fetch or the write failed; the archive is untouched.
    Failed { reason: String },
}

impl StepOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, StepOutcome::Written { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// Both step outcomes for one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandleReport {
    pub handle: Handle,
    pub contribution: StepOutcome,
    pub comments: StepOutcome,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub handles: Vec<HandleReport>,
    /// The rebuilt index; `None` in dry-run mode.
    pub index: Option<SnapshotIndex>,
}

impl RunReport {
    pub fn snapshots_written(&self) -> usize {
        self.steps().filter(|s| s.is_written()).count()
    }

    pub fn failures(&self) -> usize {
        self.steps().filter(|s| s.is_failed()).count()
    }

    fn steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.handles
            .iter()
            .flat_map(|h| [&h.contribution, &h.comments])
    }
}

// ---------------------------------------------------------------------------
// Per-handle steps
// ---------------------------------------------------------------------------

fn failed(reason: impl Into<String>) -> StepOutcome {
    StepOutcome::Failed {
        reason: reason.into(),
    }
}

fn refresh_contribution<A: ContributionApi + ?Sized>(
    api: &A,
    store: &ArchiveStore,
    handle: &Handle,
) -> StepOutcome {
    let detail = match api.find_contribution(handle) {
        Ok(detail) => detail,
        Err(err) => {
            tracing::warn!("failed to fetch detail for {handle}: {err}");
            return failed(err.to_string());
        }
    };
    match store.write_contribution_snapshot(handle, &detail) {
        Ok(path) => StepOutcome::Written { path },
        Err(err) => {
            tracing::warn!("failed to archive detail for {handle}: {err}");
            failed(err.to_string())
        }
    }
}

fn refresh_comments<A: ContributionApi + ?Sized>(
    api: &A,
    store: &ArchiveStore,
    summary: &ContributionSummary,
) -> StepOutcome {
    let handle = &summary.public_handle;
    let Some(commentable_id) = summary.commentable_id else {
        tracing::warn!("cannot fetch comments for {handle}: no commentableId");
        return failed("no commentableId");
    };

    let collected = match collect_comments(api, handle, commentable_id) {
        Ok(collected) => collected,
        Err(err) => {
            tracing::warn!("failed to fetch comments for {handle}: {err}");
            return failed(err.to_string());
        }
    };
    if !collected.failed_reply_fetches.is_empty() {
        tracing::warn!(
            "{handle}: archiving comments without {} reply thread(s)",
            collected.failed_reply_fetches.len()
        );
    }

    match store.write_comment_snapshot(handle, &collected.comments) {
        Ok(path) => StepOutcome::Written { path },
        Err(err) => {
            tracing::warn!("failed to archive comments for {handle}: {err}");
            failed(err.to_string())
        }
    }
}

fn planned_step(
    handle: &Handle,
    what: &str,
    reason: Option<UpdateReason>,
    dry_run: bool,
    refresh: impl FnOnce() -> StepOutcome,
) -> StepOutcome {
    let Some(reason) = reason else {
        tracing::debug!("{handle}: {what} unchanged");
        return StepOutcome::Unchanged;
    };
    if dry_run {
        tracing::info!("[dry-run] {handle}: {what} would update ({reason})");
        return StepOutcome::WouldWrite {
            reason: reason.to_string(),
        };
    }
    tracing::info!("{handle}: {what} update ({reason})");
    refresh()
}

/// Plan and apply both updates for one contribution.
pub fn sync_handle<A: ContributionApi + ?Sized>(
    api: &A,
    store: &ArchiveStore,
    summary: &ContributionSummary,
    dry_run: bool,
) -> HandleReport {
    let handle = &summary.public_handle;
    let plan = plan_update(store, summary);
    if plan.is_noop() {
        tracing::debug!("{handle}: up to date");
        return HandleReport {
            handle: handle.clone(),
            contribution: StepOutcome::Unchanged,
            comments: StepOutcome::Unchanged,
        };
    }
    tracing::debug!(
        contribution = plan.needs_contribution_update(),
        comments = plan.needs_comments_update(),
        "{handle}: planned"
    );

    let contribution = planned_step(handle, "contribution", plan.contribution, dry_run, || {
        refresh_contribution(api, store, handle)
    });
    let comments = planned_step(handle, "comments", plan.comments, dry_run, || {
        refresh_comments(api, store, summary)
    });

    HandleReport {
        handle: handle.clone(),
        contribution,
        comments,
    }
}

// ---------------------------------------------------------------------------
// sync_contributions
// ---------------------------------------------------------------------------

/// Run steps 1–7 over already-fetched pending and accepted lists.
///
/// Only an index rebuild failure is returned as an error; every per-handle
/// failure is recorded in the report.
pub fn sync_contributions<A: ContributionApi + ?Sized>(
    api: &A,
    store: &ArchiveStore,
    pending: Vec<ContributionSummary>,
    accepted: Vec<ContributionSummary>,
    options: &RunOptions,
) -> Result<RunReport, SyncError> {
    let working = build_working_set(
        api,
        pending,
        accepted,
        &options.extra_handles,
        options.test_handles.as_deref(),
    );

    let handles: Vec<HandleReport> = working
        .iter()
        .map(|summary| sync_handle(api, store, summary, options.dry_run))
        .collect();

    let index = if options.dry_run {
        None
    } else {
        tracing::info!("generating index");
        Some(store.rebuild_index()?)
    };

    let report = RunReport { handles, index };
    tracing::info!(
        "update completed: {} handle(s), {} snapshot(s) written, {} failure(s)",
        report.handles.len(),
        report.snapshots_written(),
        report.failures()
    );
    Ok(report)
}
