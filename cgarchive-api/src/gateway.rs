//! The gateway seam the sync orchestrator depends on.

use cgarchive_core::types::{
    Comment, CommentId, CommentableId, ContributionDetail, ContributionSummary, Handle,
};

use crate::error::ApiResult;

/// The five remote operations, one request/response round trip each.
///
/// Implementations do not retry or cache.
pub trait ContributionApi {
    /// Contributions awaiting review for the configured user.
    fn list_pending(&self) -> ApiResult<Vec<ContributionSummary>>;

    /// All accepted contributions.
    fn list_accepted(&self) -> ApiResult<Vec<ContributionSummary>>;

    /// Full record for one handle.
    fn find_contribution(&self, handle: &Handle) -> ApiResult<ContributionDetail>;

    fn first_level_comments(&self, commentable_id: CommentableId) -> ApiResult<Vec<Comment>>;

    /// Replies under one first-level comment.
    fn second_level_comments(&self, comment_id: CommentId) -> ApiResult<Vec<Comment>>;
}

impl<T: ContributionApi + ?Sized> ContributionApi for &T {
    fn list_pending(&self) -> ApiResult<Vec<ContributionSummary>> {
        (**self).list_pending()
    }

    fn list_accepted(&self) -> ApiResult<Vec<ContributionSummary>> {
        (**self).list_accepted()
    }

    fn find_contribution(&self, handle: &Handle) -> ApiResult<ContributionDetail> {
        (**self).find_contribution(handle)
    }

    fn first_level_comments(&self, commentable_id: CommentableId) -> ApiResult<Vec<Comment>> {
        (**self).first_level_comments(commentable_id)
    }

    fn second_level_comments(&self, comment_id: CommentId) -> ApiResult<Vec<Comment>> {
        (**self).second_level_comments(comment_id)
    }
}
