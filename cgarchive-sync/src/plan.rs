//! Per-handle change detection.
//!
//! Two independent signals:
//! - contribution: no snapshot yet, or `activeVersion` differs from the
//!   latest snapshot's
//! - comments: no comment snapshot yet, or its length differs from the
//!   summary's `commentCount` (an absent count never forces an update)
//!
//! A latest snapshot that cannot be read counts as needing an update, so the
//! next successful write supersedes it.

use std::fmt;

use serde_json::Value;

use cgarchive_core::types::ContributionSummary;
use cgarchive_store::ArchiveStore;

/// Why a record needs a fresh snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateReason {
    /// Nothing archived for this handle yet.
    New,
    VersionChanged {
        from: Option<Value>,
        to: Option<Value>,
    },
    CountChanged { from: usize, to: u64 },
    /// The latest snapshot exists but could not be read.
    Unreadable { reason: String },
}

impl fmt::Display for UpdateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpdateReason::New => write!(f, "new"),
            UpdateReason::VersionChanged { from, to } => {
                write!(f, "version {} -> {}", display_version(from), display_version(to))
            }
            UpdateReason::CountChanged { from, to } => write!(f, "count {from} -> {to}"),
            UpdateReason::Unreadable { reason } => write!(f, "unreadable snapshot: {reason}"),
        }
    }
}

fn display_version(v: &Option<Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => "none".to_string(),
    }
}

/// The two update decisions for one handle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdatePlan {
    pub contribution: Option<UpdateReason>,
    pub comments: Option<UpdateReason>,
}

impl UpdatePlan {
    pub fn needs_contribution_update(&self) -> bool {
        self.contribution.is_some()
    }

    pub fn needs_comments_update(&self) -> bool {
        self.comments.is_some()
    }

    pub fn is_noop(&self) -> bool {
        self.contribution.is_none() && self.comments.is_none()
    }
}

/// Decide both signals for `summary` against the archive.
pub fn plan_update(store: &ArchiveStore, summary: &ContributionSummary) -> UpdatePlan {
    UpdatePlan {
        contribution: contribution_reason(store, summary),
        comments: comments_reason(store, summary),
    }
}

fn contribution_reason(store: &ArchiveStore, summary: &ContributionSummary) -> Option<UpdateReason> {
    match store.latest_contribution_snapshot(&summary.public_handle) {
        Ok(None) => Some(UpdateReason::New),
        Ok(Some(latest)) => {
            let stored = latest.active_version();
            (stored != summary.active_version).then(|| UpdateReason::VersionChanged {
                from: stored,
                to: summary.active_version.clone(),
            })
        }
        Err(err) => Some(UpdateReason::Unreadable {
            reason: err.to_string(),
        }),
    }
}

fn comments_reason(store: &ArchiveStore, summary: &ContributionSummary) -> Option<UpdateReason> {
    match store.latest_comment_snapshot(&summary.public_handle) {
        Ok(None) => Some(UpdateReason::New),
        Ok(Some(latest)) => match summary.comment_count {
            Some(count) if latest.len() as u64 != count => Some(UpdateReason::CountChanged {
                from: latest.len(),
                to: count,
            }),
            _ => None,
        },
        Err(err) => Some(UpdateReason::Unreadable {
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgarchive_core::types::{Comment, ContributionDetail, Handle};
    use serde_json::json;
    use tempfile::TempDir;

    fn summary(version: Value, count: Option<u64>) -> ContributionSummary {
        ContributionSummary {
            public_handle: Handle::from("h1"),
            active_version: Some(version),
            comment_count: count,
            commentable_id: None,
        }
    }

    fn seed(store: &ArchiveStore, version: Value, comments: usize) {
        let h = Handle::from("h1");
        let detail: ContributionDetail =
            serde_json::from_value(json!({ "publicHandle": "h1", "activeVersion": version }))
                .unwrap();
        store.write_contribution_snapshot(&h, &detail).unwrap();
        let set: Vec<Comment> = (0..comments)
            .map(|i| serde_json::from_value(json!({ "commentId": i })).unwrap())
            .collect();
        store.write_comment_snapshot(&h, &set).unwrap();
    }

    #[test]
    fn never_archived_needs_both() {
        let tmp = TempDir::new().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        let plan = plan_update(&store, &summary(json!(1), Some(0)));
        assert_eq!(plan.contribution, Some(UpdateReason::New));
        assert_eq!(plan.comments, Some(UpdateReason::New));
    }

    #[test]
    fn unchanged_needs_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        seed(&store, json!(3), 2);
        assert!(plan_update(&store, &summary(json!(3), Some(2))).is_noop());
    }

    #[test]
    fn version_change_detected() {
        let tmp = TempDir::new().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        seed(&store, json!(3), 2);
        let plan = plan_update(&store, &summary(json!(4), Some(2)));
        assert_eq!(
            plan.contribution,
            Some(UpdateReason::VersionChanged {
                from: Some(json!(3)),
                to: Some(json!(4)),
            })
        );
        assert!(!plan.needs_comments_update());
    }

    #[test]
    fn count_change_detected() {
        let tmp = TempDir::new().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        seed(&store, json!(3), 2);
        let plan = plan_update(&store, &summary(json!(3), Some(5)));
        assert!(!plan.needs_contribution_update());
        assert_eq!(plan.comments, Some(UpdateReason::CountChanged { from: 2, to: 5 }));
    }

    #[test]
    fn absent_count_does_not_force_comment_update() {
        let tmp = TempDir::new().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        seed(&store, json!(3), 2);
        assert!(!plan_update(&store, &summary(json!(3), None)).needs_comments_update());
    }

    #[test]
    fn unreadable_snapshot_needs_update() {
        let tmp = TempDir::new().unwrap();
        let store = ArchiveStore::open(tmp.path()).unwrap();
        let dir = tmp.path().join("contributions").join("h1");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("2024-01-01_00-00-00.json"), "garbage").unwrap();

        let plan = plan_update(&store, &summary(json!(1), Some(0)));
        assert!(matches!(
            plan.contribution,
            Some(UpdateReason::Unreadable { .. })
        ));
    }

    #[test]
    fn reason_display() {
        let reason = UpdateReason::VersionChanged {
            from: Some(json!("a1")),
            to: None,
        };
        assert_eq!(reason.to_string(), "version a1 -> none");
        assert_eq!(
            UpdateReason::CountChanged { from: 1, to: 3 }.to_string(),
            "count 1 -> 3"
        );
    }
}
