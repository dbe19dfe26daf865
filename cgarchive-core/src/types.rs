//! Domain types for archived contributions and their comment threads.
//!
//! Records arriving from the remote service are only partially typed: the
//! fields the sync logic reads are named, everything else rides along in a
//! flattened JSON map so snapshots persist what the service returned.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable public identifier of a contribution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(pub String);

impl Handle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Handle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a single comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(pub i64);

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier used to fetch the comment thread attached to a contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentableId(pub i64);

impl fmt::Display for CommentableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Contributions
// ---------------------------------------------------------------------------

/// Lightweight contribution entry as returned by the list calls.
///
/// Never persisted; only used to decide what needs refreshing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSummary {
    pub public_handle: Handle,
    /// Opaque version token; compared by JSON equality only.
    #[serde(default)]
    pub active_version: Option<Value>,
    #[serde(default)]
    pub comment_count: Option<u64>,
    #[serde(default)]
    pub commentable_id: Option<CommentableId>,
}

/// Full contribution record returned by find-by-handle.
///
/// Persisted verbatim: the record is held as the raw JSON object, explicit
/// `null`s included, and the fields the sync logic reads are accessors over
/// it. A `null` reads the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContributionDetail {
    pub fields: Map<String, Value>,
}

impl ContributionDetail {
    /// Raw value of `key`, `None` when absent or `null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    pub fn public_handle(&self) -> Option<Handle> {
        self.get("publicHandle")
            .and_then(Value::as_str)
            .map(Handle::from)
    }

    pub fn active_version(&self) -> Option<Value> {
        self.get("activeVersion").cloned()
    }

    pub fn comment_count(&self) -> Option<u64> {
        self.get("commentCount").and_then(Value::as_u64)
    }

    pub fn commentable_id(&self) -> Option<CommentableId> {
        self.get("commentableId")
            .and_then(Value::as_i64)
            .map(CommentableId)
    }

    /// Fold this detail into the summary shape used by the list calls.
    ///
    /// `handle` is the handle the detail was requested under; the detail's
    /// own `publicHandle` is not trusted for identity.
    pub fn to_summary(&self, handle: &Handle) -> ContributionSummary {
        ContributionSummary {
            public_handle: handle.clone(),
            active_version: self.active_version(),
            comment_count: self.comment_count(),
            commentable_id: self.commentable_id(),
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A single comment, first- or second-level.
///
/// Only `commentId` is required; everything else, `responseCount`
/// included, stays in `rest` exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: CommentId,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl Comment {
    /// Reply count; absent, `null` or non-numeric reads as 0.
    pub fn response_count(&self) -> u64 {
        self.rest
            .get("responseCount")
            .and_then(Value::as_u64)
            .unwrap_or(0)
    }

    /// Whether replies beyond the one inlined in the first-level response
    /// exist and need a separate fetch.
    pub fn has_uninlined_replies(&self) -> bool {
        self.response_count() >= 2
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
