//! End-to-end update-cycle tests against an in-memory gateway.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use cgarchive_api::{ApiError, ApiResult, ContributionApi, Operation};
use cgarchive_core::types::{
    Comment, CommentId, CommentableId, ContributionDetail, ContributionSummary, Handle,
};
use cgarchive_store::{ArchiveStore, SnapshotKind};
use cgarchive_sync::{
    pipeline, sync_contributions, RunOptions, StepOutcome, SyncError,
};
use serde_json::{json, Value};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Fake gateway
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeApi {
    pending: Vec<ContributionSummary>,
    accepted: Vec<ContributionSummary>,
    details: HashMap<String, Value>,
    first_level: HashMap<i64, Vec<Value>>,
    second_level: HashMap<i64, Vec<Value>>,
    fail_lists: bool,
    fail_details: HashSet<String>,
    fail_replies: HashSet<i64>,
    calls: RefCell<Vec<(Operation, String)>>,
}

impl FakeApi {
    fn record(&self, op: Operation, arg: impl ToString) {
        self.calls.borrow_mut().push((op, arg.to_string()));
    }

    fn calls_to(&self, op: Operation) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, arg)| arg.clone())
            .collect()
    }

    /// Register a contribution in the pending list with a matching detail and
    /// `comments` first-level comments (ids `commentable * 100 + i`).
    fn with_contribution(mut self, handle: &str, version: i64, commentable: i64, comments: i64) -> Self {
        self.pending.push(summary(handle, version, Some(comments as u64), Some(commentable)));
        self.details
            .insert(handle.to_string(), detail_json(handle, version, comments, commentable));
        self.first_level.insert(
            commentable,
            (0..comments)
                .map(|i| json!({ "commentId": commentable * 100 + i, "content": "hi" }))
                .collect(),
        );
        self
    }
}

fn fail(operation: Operation, message: &str) -> ApiError {
    ApiError::RequestFailed {
        operation,
        status: Some(500),
        message: message.to_string(),
    }
}

impl ContributionApi for FakeApi {
    fn list_pending(&self) -> ApiResult<Vec<ContributionSummary>> {
        self.record(Operation::ListPending, "");
        if self.fail_lists {
            return Err(fail(Operation::ListPending, "down"));
        }
        Ok(self.pending.clone())
    }

    fn list_accepted(&self) -> ApiResult<Vec<ContributionSummary>> {
        self.record(Operation::ListAccepted, "");
        Ok(self.accepted.clone())
    }

    fn find_contribution(&self, handle: &Handle) -> ApiResult<ContributionDetail> {
        self.record(Operation::FindContribution, handle);
        if self.fail_details.contains(handle.as_str()) {
            return Err(fail(Operation::FindContribution, "boom"));
        }
        let raw = self
            .details
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| fail(Operation::FindContribution, "not found"))?;
        Ok(serde_json::from_value(raw).expect("fake detail"))
    }

    fn first_level_comments(&self, commentable_id: CommentableId) -> ApiResult<Vec<Comment>> {
        self.record(Operation::FirstLevelComments, commentable_id);
        let raw = self
            .first_level
            .get(&commentable_id.0)
            .cloned()
            .unwrap_or_default();
        Ok(serde_json::from_value(Value::Array(raw)).expect("fake comments"))
    }

    fn second_level_comments(&self, comment_id: CommentId) -> ApiResult<Vec<Comment>> {
        self.record(Operation::SecondLevelComments, comment_id);
        if self.fail_replies.contains(&comment_id.0) {
            return Err(fail(Operation::SecondLevelComments, "replies unavailable"));
        }
        let raw = self
            .second_level
            .get(&comment_id.0)
            .cloned()
            .unwrap_or_default();
        Ok(serde_json::from_value(Value::Array(raw)).expect("fake replies"))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn summary(
    handle: &str,
    version: i64,
    comment_count: Option<u64>,
    commentable: Option<i64>,
) -> ContributionSummary {
    ContributionSummary {
        public_handle: Handle::from(handle),
        active_version: Some(json!(version)),
        comment_count,
        commentable_id: commentable.map(CommentableId),
    }
}

fn detail_json(handle: &str, version: i64, comments: i64, commentable: i64) -> Value {
    json!({
        "publicHandle": handle,
        "activeVersion": version,
        "commentCount": comments,
        "commentableId": commentable,
        "title": format!("Puzzle {handle}"),
    })
}

fn open_store() -> (TempDir, ArchiveStore) {
    let tmp = TempDir::new().expect("tempdir");
    let store = ArchiveStore::open(tmp.path().join("data")).expect("open");
    (tmp, store)
}

fn count(store: &ArchiveStore, kind: SnapshotKind, handle: &str) -> usize {
    store
        .snapshot_names(kind, &Handle::from(handle))
        .expect("list")
        .len()
}

fn run(api: &FakeApi, store: &ArchiveStore, options: &RunOptions) -> cgarchive_sync::RunReport {
    pipeline::run(api, store, options).expect("run")
}

// ---------------------------------------------------------------------------
// 1. First run and idempotence
// ---------------------------------------------------------------------------

#[test]
fn first_run_archives_one_snapshot_of_each_kind_per_handle() {
    let (_tmp, store) = open_store();
    let api = FakeApi::default()
        .with_contribution("alpha", 1, 10, 2)
        .with_contribution("beta", 1, 20, 0);

    let report = run(&api, &store, &RunOptions::default());

    assert_eq!(report.handles.len(), 2);
    for handle in ["alpha", "beta"] {
        assert_eq!(count(&store, SnapshotKind::Contributions, handle), 1);
        assert_eq!(count(&store, SnapshotKind::Comments, handle), 1);
    }
    assert_eq!(report.snapshots_written(), 4);
    assert_eq!(report.failures(), 0);

    let latest = store
        .latest_contribution_snapshot(&Handle::from("alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(latest.fields["title"], json!("Puzzle alpha"));
    assert_eq!(
        store
            .latest_comment_snapshot(&Handle::from("alpha"))
            .unwrap()
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn second_identical_run_writes_nothing() {
    let (_tmp, store) = open_store();
    let api = FakeApi::default()
        .with_contribution("alpha", 3, 10, 2)
        .with_contribution("beta", 1, 20, 1);

    run(&api, &store, &RunOptions::default());
    let finds_after_first = api.calls_to(Operation::FindContribution).len();

    let report = run(&api, &store, &RunOptions::default());

    for h in &report.handles {
        assert_eq!(h.contribution, StepOutcome::Unchanged, "{}", h.handle);
        assert_eq!(h.comments, StepOutcome::Unchanged, "{}", h.handle);
    }
    assert_eq!(count(&store, SnapshotKind::Contributions, "alpha"), 1);
    assert_eq!(count(&store, SnapshotKind::Comments, "beta"), 1);
    assert_eq!(
        api.calls_to(Operation::FindContribution).len(),
        finds_after_first,
        "unchanged handles must not be re-fetched"
    );
    assert!(report.index.is_some(), "index is rebuilt even when idle");
}

#[test]
fn version_change_archives_only_the_contribution() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default().with_contribution("alpha", 1, 10, 1);
    run(&api, &store, &RunOptions::default());

    api.pending[0].active_version = Some(json!(2));
    api.details
        .insert("alpha".to_string(), detail_json("alpha", 2, 1, 10));
    let report = run(&api, &store, &RunOptions::default());

    assert!(report.handles[0].contribution.is_written());
    assert_eq!(report.handles[0].comments, StepOutcome::Unchanged);
    assert_eq!(count(&store, SnapshotKind::Contributions, "alpha"), 2);
    let latest = store
        .latest_contribution_snapshot(&Handle::from("alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(latest.active_version(), Some(json!(2)));
}

#[test]
fn comment_count_change_archives_only_comments() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default().with_contribution("alpha", 1, 10, 1);
    run(&api, &store, &RunOptions::default());

    api.pending[0].comment_count = Some(2);
    api.first_level
        .get_mut(&10)
        .unwrap()
        .push(json!({ "commentId": 1001, "content": "new" }));
    let report = run(&api, &store, &RunOptions::default());

    assert_eq!(report.handles[0].contribution, StepOutcome::Unchanged);
    assert!(report.handles[0].comments.is_written());
    assert_eq!(count(&store, SnapshotKind::Comments, "alpha"), 2);
}

#[test]
fn absent_comment_count_is_not_a_change_signal() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default().with_contribution("alpha", 1, 10, 1);
    run(&api, &store, &RunOptions::default());

    api.pending[0].comment_count = None;
    let report = run(&api, &store, &RunOptions::default());

    assert_eq!(report.handles[0].comments, StepOutcome::Unchanged);
    assert_eq!(api.calls_to(Operation::FirstLevelComments).len(), 1);
}

// ---------------------------------------------------------------------------
// 2. Comment merge
// ---------------------------------------------------------------------------

#[test]
fn second_level_merge_adds_only_novel_ids() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default();
    api.pending.push(summary("alpha", 1, Some(4), Some(10)));
    api.details
        .insert("alpha".to_string(), detail_json("alpha", 1, 4, 10));
    api.first_level.insert(
        10,
        vec![
            json!({ "commentId": 1, "responseCount": 3, "content": "parent" }),
            json!({ "commentId": 2, "responseCount": 0, "content": "inlined reply" }),
            json!({ "commentId": 3, "responseCount": 1, "content": "other" }),
        ],
    );
    api.second_level.insert(
        1,
        vec![
            json!({ "commentId": 2, "content": "inlined reply (copy)" }),
            json!({ "commentId": 3, "content": "other (copy)" }),
            json!({ "commentId": 4, "content": "novel" }),
        ],
    );

    run(&api, &store, &RunOptions::default());

    let saved = store
        .latest_comment_snapshot(&Handle::from("alpha"))
        .unwrap()
        .unwrap();
    let ids: Vec<i64> = saved.iter().map(|c| c.comment_id.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(saved[1].rest["content"], json!("inlined reply"));
    assert_eq!(
        api.calls_to(Operation::SecondLevelComments),
        vec!["1".to_string()],
        "only comments with two or more replies are expanded"
    );
}

#[test]
fn null_response_count_keeps_the_comment_set() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default();
    api.pending.push(summary("alpha", 1, Some(2), Some(10)));
    api.details
        .insert("alpha".to_string(), detail_json("alpha", 1, 2, 10));
    api.first_level.insert(
        10,
        vec![
            json!({ "commentId": 1, "responseCount": null, "content": "parent" }),
            json!({ "commentId": 2, "content": "plain" }),
        ],
    );

    let report = run(&api, &store, &RunOptions::default());

    assert!(report.handles[0].comments.is_written());
    let saved = store
        .latest_comment_snapshot(&Handle::from("alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].rest["responseCount"], Value::Null);
    assert!(api.calls_to(Operation::SecondLevelComments).is_empty());
}

#[test]
fn detail_snapshot_keeps_explicit_nulls() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default();
    api.pending.push(summary("alpha", 1, None, None));
    let raw = json!({
        "publicHandle": "alpha",
        "activeVersion": 1,
        "commentCount": null,
        "commentableId": null,
        "title": "Puzzle alpha",
    });
    api.details.insert("alpha".to_string(), raw.clone());

    run(&api, &store, &RunOptions::default());

    let path = store
        .latest_snapshot_path(SnapshotKind::Contributions, &Handle::from("alpha"))
        .unwrap()
        .expect("snapshot");
    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(on_disk, raw);
}

#[test]
fn failed_reply_fetch_still_archives_the_rest() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default();
    api.pending.push(summary("alpha", 1, Some(5), Some(10)));
    api.details
        .insert("alpha".to_string(), detail_json("alpha", 1, 5, 10));
    api.first_level.insert(
        10,
        vec![
            json!({ "commentId": 1, "responseCount": 2 }),
            json!({ "commentId": 2, "responseCount": 5 }),
        ],
    );
    api.second_level
        .insert(2, vec![json!({ "commentId": 20 }), json!({ "commentId": 21 })]);
    api.fail_replies.insert(1);

    let report = run(&api, &store, &RunOptions::default());

    assert!(report.handles[0].comments.is_written());
    let saved = store
        .latest_comment_snapshot(&Handle::from("alpha"))
        .unwrap()
        .unwrap();
    assert_eq!(saved.len(), 4);
}

// ---------------------------------------------------------------------------
// 3. Working set
// ---------------------------------------------------------------------------

#[test]
fn extra_handle_already_listed_appears_once() {
    let (_tmp, store) = open_store();
    let api = FakeApi::default().with_contribution("alpha", 1, 10, 0);
    let options = RunOptions {
        extra_handles: vec![Handle::from("alpha")],
        ..RunOptions::default()
    };

    let report = run(&api, &store, &options);

    assert_eq!(report.handles.len(), 1);
    assert_eq!(
        api.calls_to(Operation::FindContribution),
        vec!["alpha".to_string()],
        "only the snapshot fetch, no resolution fetch"
    );
}

#[test]
fn extra_handles_are_resolved_and_failures_skipped() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default().with_contribution("alpha", 1, 10, 0);
    api.details
        .insert("private".to_string(), detail_json("private", 7, 0, 30));
    let options = RunOptions {
        extra_handles: vec![
            Handle::from("private"),
            Handle::from("missing"),
            Handle::from("private"),
        ],
        ..RunOptions::default()
    };

    let report = run(&api, &store, &options);

    let handles: Vec<&str> = report.handles.iter().map(|h| h.handle.as_str()).collect();
    assert_eq!(handles, vec!["alpha", "private"]);
    assert_eq!(count(&store, SnapshotKind::Contributions, "private"), 1);
    assert_eq!(count(&store, SnapshotKind::Comments, "private"), 1);
}

#[test]
fn test_filter_keeps_only_matching_handles() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default();
    for (i, h) in ["a", "b", "c", "d", "e"].iter().enumerate() {
        api = api.with_contribution(h, 1, i as i64 + 1, 0);
    }
    let options = RunOptions {
        test_handles: Some(vec![Handle::from("c"), Handle::from("does-not-exist")]),
        ..RunOptions::default()
    };

    let report = run(&api, &store, &options);

    assert_eq!(report.handles.len(), 1);
    assert_eq!(report.handles[0].handle, Handle::from("c"));
    assert_eq!(count(&store, SnapshotKind::Contributions, "a"), 0);
}

#[test]
fn accepted_duplicate_of_pending_is_ignored() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default().with_contribution("alpha", 1, 10, 0);
    api.accepted.push(summary("alpha", 99, Some(0), Some(10)));
    api.accepted.push(summary("gamma", 1, Some(0), Some(40)));
    api.details
        .insert("gamma".to_string(), detail_json("gamma", 1, 0, 40));

    let report = pipeline::run(&api, &store, &RunOptions::default()).expect("run");

    let handles: Vec<&str> = report.handles.iter().map(|h| h.handle.as_str()).collect();
    assert_eq!(handles, vec!["alpha", "gamma"]);
}

// ---------------------------------------------------------------------------
// 4. Failure isolation
// ---------------------------------------------------------------------------

#[test]
fn detail_failure_for_one_handle_does_not_block_others() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default()
        .with_contribution("h1", 1, 1, 0)
        .with_contribution("h2", 1, 2, 1)
        .with_contribution("h3", 1, 3, 0);
    api.fail_details.insert("h2".to_string());

    let report = run(&api, &store, &RunOptions::default());

    assert!(report.handles[0].contribution.is_written());
    assert!(report.handles[1].contribution.is_failed());
    assert!(
        report.handles[1].comments.is_written(),
        "comments step is independent of the detail step"
    );
    assert!(report.handles[2].contribution.is_written());

    let index = report.index.expect("index rebuilt");
    assert!(index.contributions.contains_key(&Handle::from("h1")));
    assert!(!index.contributions.contains_key(&Handle::from("h2")));
    assert!(index.contributions.contains_key(&Handle::from("h3")));
    assert!(store.index_path().exists());
}

#[test]
fn missing_commentable_id_fails_only_the_comment_step() {
    let (_tmp, store) = open_store();
    let mut api = FakeApi::default();
    api.pending.push(summary("alpha", 1, Some(0), None));
    api.details
        .insert("alpha".to_string(), json!({ "publicHandle": "alpha", "activeVersion": 1 }));

    let report = run(&api, &store, &RunOptions::default());

    assert!(report.handles[0].contribution.is_written());
    assert!(report.handles[0].comments.is_failed());
    assert!(api.calls_to(Operation::FirstLevelComments).is_empty());
}

#[test]
fn list_failure_is_fatal_and_touches_nothing() {
    let (_tmp, store) = open_store();
    let api = FakeApi {
        fail_lists: true,
        ..FakeApi::default()
    };

    let err = pipeline::run(&api, &store, &RunOptions::default()).unwrap_err();

    assert!(matches!(err, SyncError::ListFetch(_)), "got: {err}");
    assert!(!store.index_path().exists());
}

// ---------------------------------------------------------------------------
// 5. Dry run
// ---------------------------------------------------------------------------

#[test]
fn dry_run_plans_without_fetching_or_writing() {
    let (_tmp, store) = open_store();
    let api = FakeApi::default().with_contribution("alpha", 1, 10, 2);
    let options = RunOptions {
        dry_run: true,
        ..RunOptions::default()
    };

    let report = sync_contributions(
        &api,
        &store,
        api.pending.clone(),
        api.accepted.clone(),
        &options,
    )
    .expect("dry run");

    assert!(matches!(
        report.handles[0].contribution,
        StepOutcome::WouldWrite { .. }
    ));
    assert!(matches!(
        report.handles[0].comments,
        StepOutcome::WouldWrite { .. }
    ));
    assert!(report.index.is_none());
    assert!(api.calls_to(Operation::FindContribution).is_empty());
    assert!(api.calls_to(Operation::FirstLevelComments).is_empty());
    assert_eq!(count(&store, SnapshotKind::Contributions, "alpha"), 0);
    assert!(!store.index_path().exists());
}
