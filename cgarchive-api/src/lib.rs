//! # cgarchive-api
//!
//! Gateway to the remote contribution service.
//!
//! The sync core talks to [`ContributionApi`]; [`HttpGateway`] is the
//! production implementation.

pub mod error;
pub mod gateway;
pub mod http;
pub mod operation;

pub use error::{ApiError, ApiResult};
pub use gateway::ContributionApi;
pub use http::HttpGateway;
pub use operation::Operation;
