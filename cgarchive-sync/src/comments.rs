//! Comment-set collection.
//!
//! The first-level response inlines at most one reply per comment, so only
//! comments with two or more replies need a second-level fetch. Replies are
//! merged by `commentId`; entries already present are never replaced.

use std::collections::HashSet;

use cgarchive_api::{ApiError, ContributionApi};
use cgarchive_core::types::{Comment, CommentId, CommentableId, Handle};

/// A collected comment set plus the reply fetches that failed along the way.
#[derive(Debug)]
pub struct CollectedComments {
    pub comments: Vec<Comment>,
    pub failed_reply_fetches: Vec<(CommentId, ApiError)>,
}

/// Append each reply whose `commentId` is not already in `comments`.
///
/// Returns the number of replies appended.
pub fn merge_replies(comments: &mut Vec<Comment>, replies: Vec<Comment>) -> usize {
    let mut known: HashSet<CommentId> = comments.iter().map(|c| c.comment_id).collect();
    let before = comments.len();
    for reply in replies {
        if known.insert(reply.comment_id) {
            comments.push(reply);
        }
    }
    comments.len() - before
}

/// Fetch first-level comments, then expand every thread with uninlined
/// replies.
///
/// Only the first-level fetch is fatal to the collection; a failed
/// second-level fetch is logged and recorded, and the rest of the set is
/// still returned.
pub fn collect_comments<A: ContributionApi + ?Sized>(
    api: &A,
    handle: &Handle,
    commentable_id: CommentableId,
) -> Result<CollectedComments, ApiError> {
    let mut comments = api.first_level_comments(commentable_id)?;

    let parents: Vec<CommentId> = comments
        .iter()
        .filter(|c| c.has_uninlined_replies())
        .map(|c| c.comment_id)
        .collect();

    let mut failed_reply_fetches = Vec::new();
    for parent in parents {
        match api.second_level_comments(parent) {
            Ok(replies) => {
                let added = merge_replies(&mut comments, replies);
                tracing::debug!("{handle}: merged {added} new reply(ies) under comment {parent}");
            }
            Err(err) => {
                tracing::warn!("{handle}: failed to fetch replies to comment {parent}: {err}");
                failed_reply_fetches.push((parent, err));
            }
        }
    }

    Ok(CollectedComments {
        comments,
        failed_reply_fetches,
    })
}
