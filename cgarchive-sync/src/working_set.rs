//! Assembly of the list of contributions a run will consider.
//!
//! Order of operations:
//! 1. pending then accepted, deduplicated by handle (first occurrence wins)
//! 2. extra handles not already present, resolved one by one
//! 3. optional allow-list filter, preserving working-set order

use std::collections::HashSet;

use cgarchive_api::ContributionApi;
use cgarchive_core::types::{ContributionSummary, Handle};

/// Concatenate both lists, keeping the first summary seen for each handle.
pub fn union_by_handle(
    pending: Vec<ContributionSummary>,
    accepted: Vec<ContributionSummary>,
) -> Vec<ContributionSummary> {
    let mut seen = HashSet::new();
    pending
        .into_iter()
        .chain(accepted)
        .filter(|s| seen.insert(s.public_handle.clone()))
        .collect()
}

/// Append a synthesized summary for each extra handle not already present.
///
/// A handle whose lookup fails is logged and skipped.
pub fn resolve_extra_handles<A: ContributionApi + ?Sized>(
    api: &A,
    working: &mut Vec<ContributionSummary>,
    extra_handles: &[Handle],
) {
    if extra_handles.is_empty() {
        return;
    }
    tracing::info!("resolving {} extra handle(s)", extra_handles.len());

    for handle in extra_handles {
        if working.iter().any(|s| &s.public_handle == handle) {
            tracing::debug!("extra handle {handle} already listed");
            continue;
        }
        match api.find_contribution(handle) {
            Ok(detail) => working.push(detail.to_summary(handle)),
            Err(err) => tracing::warn!("skipping extra handle {handle}: {err}"),
        }
    }
}

/// Keep only summaries whose handle is in `allow`, in working-set order.
///
/// Allow-list entries with no matching summary are reported at `warn`.
pub fn apply_filter(working: Vec<ContributionSummary>, allow: &[Handle]) -> Vec<ContributionSummary> {
    let allowed: HashSet<&Handle> = allow.iter().collect();
    let filtered: Vec<ContributionSummary> = working
        .into_iter()
        .filter(|s| allowed.contains(&s.public_handle))
        .collect();

    for handle in allow {
        if !filtered.iter().any(|s| &s.public_handle == handle) {
            tracing::warn!("test handle {handle} matched no contribution");
        }
    }
    tracing::info!(
        "restricted to {} of {} test handle(s)",
        filtered.len(),
        allow.len()
    );
    filtered
}

/// Steps 1–3 of a run: union, extra-handle resolution, optional filter.
pub fn build_working_set<A: ContributionApi + ?Sized>(
    api: &A,
    pending: Vec<ContributionSummary>,
    accepted: Vec<ContributionSummary>,
    extra_handles: &[Handle],
    test_handles: Option<&[Handle]>,
) -> Vec<ContributionSummary> {
    let mut working = union_by_handle(pending, accepted);
    tracing::info!("found {} contribution(s) (pending + accepted)", working.len());

    resolve_extra_handles(api, &mut working, extra_handles);

    match test_handles {
        Some(allow) if !allow.is_empty() => apply_filter(working, allow),
        _ => working,
    }
}
