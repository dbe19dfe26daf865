//! Blocking HTTP implementation of [`ContributionApi`].
//!
//! This is the only place that knows about transports and status codes;
//! every failure leaves here as [`ApiError::RequestFailed`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

use cgarchive_core::{
    types::{Comment, CommentId, CommentableId, ContributionDetail, ContributionSummary, Handle},
    Config,
};

use crate::error::{ApiError, ApiResult};
use crate::gateway::ContributionApi;
use crate::operation::{self, Operation};

const CONTENT_TYPE: &str = "application/json;charset=UTF-8";
const USER_AGENT: &str = concat!("cgarchive/", env!("CARGO_PKG_VERSION"));

/// Gateway holding the session credentials attached to every call.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    agent: ureq::Agent,
    base_url: String,
    session_token: String,
    user_id: i64,
}

impl HttpGateway {
    pub fn new(
        base_url: impl Into<String>,
        session_token: impl Into<String>,
        user_id: i64,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: session_token.into(),
            user_id,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.base_url.clone(),
            config.session_token.clone(),
            config.user_id,
            config.timeout,
        )
    }

    /// One POST round trip; decodes the JSON response body into `T`.
    fn call<T: DeserializeOwned>(&self, op: Operation, args: Value) -> ApiResult<T> {
        let url = op.url(&self.base_url);
        tracing::debug!(operation = %op, %url, "request");

        let response = self
            .agent
            .post(&url)
            .set("content-type", CONTENT_TYPE)
            .set("cookie", &self.session_token)
            .send_json(args)
            .map_err(|e| request_failed(op, e))?;

        let status = response.status();
        response
            .into_json::<T>()
            .map_err(|e| ApiError::RequestFailed {
                operation: op,
                status: Some(status),
                message: format!("failed to decode response body: {e}"),
            })
    }
}

fn request_failed(operation: Operation, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(code, response) => ApiError::RequestFailed {
            operation,
            status: Some(code),
            message: response.status_text().to_string(),
        },
        ureq::Error::Transport(transport) => ApiError::RequestFailed {
            operation,
            status: None,
            message: transport.to_string(),
        },
    }
}

impl ContributionApi for HttpGateway {
    fn list_pending(&self) -> ApiResult<Vec<ContributionSummary>> {
        self.call(
            Operation::ListPending,
            operation::list_pending_args(self.user_id),
        )
    }

    fn list_accepted(&self) -> ApiResult<Vec<ContributionSummary>> {
        self.call(Operation::ListAccepted, operation::list_accepted_args())
    }

    fn find_contribution(&self, handle: &Handle) -> ApiResult<ContributionDetail> {
        self.call(
            Operation::FindContribution,
            operation::find_contribution_args(handle),
        )
    }

    fn first_level_comments(&self, commentable_id: CommentableId) -> ApiResult<Vec<Comment>> {
        self.call(
            Operation::FirstLevelComments,
            operation::first_level_comments_args(self.user_id, commentable_id),
        )
    }

    fn second_level_comments(&self, comment_id: CommentId) -> ApiResult<Vec<Comment>> {
        self.call(
            Operation::SecondLevelComments,
            operation::second_level_comments_args(self.user_id, comment_id),
        )
    }
}
