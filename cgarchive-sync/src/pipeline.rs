//! Shared sync pipeline entrypoint used by the CLI.

use cgarchive_api::ContributionApi;
use cgarchive_store::ArchiveStore;

use crate::{sync_contributions, RunOptions, RunReport, SyncError};

/// Fetch both contribution lists, then run the full update cycle.
///
/// A failure of either list call is fatal: the archive and index are left
/// untouched.
pub fn run<A: ContributionApi + ?Sized>(
    api: &A,
    store: &ArchiveStore,
    options: &RunOptions,
) -> Result<RunReport, SyncError> {
    tracing::info!("fetching contributions");
    let pending = api.list_pending().map_err(SyncError::ListFetch)?;
    let accepted = api.list_accepted().map_err(SyncError::ListFetch)?;
    sync_contributions(api, store, pending, accepted, options)
}
