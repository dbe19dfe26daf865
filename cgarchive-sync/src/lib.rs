//! # cgarchive-sync
//!
//! Change detection and incremental archiving.
//!
//! Call [`pipeline::run`] to fetch the contribution lists and archive
//! whatever changed, or [`sync_contributions`] when the lists are already
//! in hand.

pub mod comments;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod plan;
pub mod working_set;

pub use error::SyncError;
pub use orchestrator::{
    sync_contributions, sync_handle, HandleReport, RunOptions, RunReport, StepOutcome,
};
pub use plan::{plan_update, UpdatePlan, UpdateReason};
