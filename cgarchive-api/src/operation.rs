//! The remote operations and their positional-argument encodings.

use std::fmt;

use serde_json::{json, Value};

use cgarchive_core::types::{CommentId, CommentableId, Handle};

/// One remote operation, addressed as `<service>/<method>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListPending,
    ListAccepted,
    FindContribution,
    FirstLevelComments,
    SecondLevelComments,
}

impl Operation {
    pub fn service(self) -> &'static str {
        match self {
            Operation::ListPending | Operation::ListAccepted | Operation::FindContribution => {
                "Contribution"
            }
            Operation::FirstLevelComments | Operation::SecondLevelComments => "Comment",
        }
    }

    pub fn method(self) -> &'static str {
        match self {
            Operation::ListPending => "getAllPendingContributions",
            Operation::ListAccepted => "getAcceptedContributions",
            Operation::FindContribution => "findContribution",
            Operation::FirstLevelComments => "getFirstLevelComments",
            Operation::SecondLevelComments => "getSecondLevelComments",
        }
    }

    /// `<base>/<service>/<method>`; `base` must not end with `/`.
    pub fn url(self, base: &str) -> String {
        format!("{base}/{}/{}", self.service(), self.method())
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service(), self.method())
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

pub(crate) fn list_pending_args(user_id: i64) -> Value {
    json!([1, "ALL", user_id])
}

pub(crate) fn list_accepted_args() -> Value {
    json!(["ALL"])
}

pub(crate) fn find_contribution_args(handle: &Handle) -> Value {
    json!([handle.as_str(), true])
}

pub(crate) fn first_level_comments_args(user_id: i64, commentable_id: CommentableId) -> Value {
    json!([user_id, commentable_id.0])
}

pub(crate) fn second_level_comments_args(user_id: i64, comment_id: CommentId) -> Value {
    json!([user_id, comment_id.0])
}
