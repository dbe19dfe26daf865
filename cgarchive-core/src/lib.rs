//! cgarchive core library: domain types, run configuration, errors.
//!
//! - [`types`]: handles, contribution and comment records
//! - [`config`]: layered configuration resolved into a [`Config`] value
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{parse_handle_list, Config, ConfigFile, ConfigOverrides};
pub use error::ConfigError;
pub use types::{
    Comment, CommentId, CommentableId, ContributionDetail, ContributionSummary, Handle,
};
